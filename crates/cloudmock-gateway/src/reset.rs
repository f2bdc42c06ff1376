//! Reset coordinator: clears every registered service between test cases.
//!
//! Callers must ensure no request is in flight while a reset runs. There is
//! no quiescence barrier here.

use std::fmt;
use std::sync::Arc;

use cloudmock_protocol::{MockService, ResetError};
use tracing::{info, warn};

/// Services whose reset failed during one reset cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetFailure {
    failures: Vec<(String, ResetError)>,
}

impl ResetFailure {
    /// Every failed service with its error, in registry order.
    #[must_use]
    pub fn failures(&self) -> &[(String, ResetError)] {
        &self.failures
    }

    /// Names of the failed services.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Display for ResetFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some((name, err)) = self.failures.first() else {
            return f.write_str("reset failed");
        };
        write!(f, "failed to reset {name}: {err}")?;
        if self.failures.len() > 1 {
            write!(f, " (and {} more)", self.failures.len() - 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for ResetFailure {}

/// Reset each service in turn, continuing past failures.
pub(crate) fn reset_services<'a>(
    services: impl IntoIterator<Item = &'a Arc<dyn MockService>>,
) -> Result<(), ResetFailure> {
    let mut failures = Vec::new();
    let mut count = 0usize;
    for service in services {
        count += 1;
        if let Err(err) = service.reset() {
            warn!(service = service.name(), error = %err, "service reset failed");
            failures.push((service.name().to_owned(), err));
        }
    }

    if failures.is_empty() {
        info!(services = count, "reset all services");
        Ok(())
    } else {
        Err(ResetFailure { failures })
    }
}
