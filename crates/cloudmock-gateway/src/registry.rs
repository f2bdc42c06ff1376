//! The service registry and the builder that freezes it into a [`Gateway`].
//!
//! Registration is applied in call order. Registering a name that is already
//! present replaces the earlier service in place (last wins), keeping the
//! original position, so a test can swap one mock without disturbing the rest.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cloudmock_core::CloudMockConfig;
use cloudmock_protocol::MockService;
use tracing::debug;

use crate::classifier::Classifier;
use crate::dispatcher::Gateway;
use crate::routes::{ServiceRoutes, builtin_routes};

/// Construction-time errors. A gateway that fails to build never serves.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Service names are non-empty lowercase ASCII letters, digits and `-`.
    #[error("invalid service name {0:?}")]
    InvalidName(String),

    /// Routes were supplied for a name no service is registered under.
    #[error("routes reference unregistered service {0:?}")]
    UnknownService(String),

    /// A routing entry is malformed on its own.
    #[error("malformed routes for {service}: {reason}")]
    MalformedRoute {
        /// Service the routes belong to.
        service: String,
        /// What is wrong with them.
        reason: String,
    },

    /// Two services claim the same routing signal.
    #[error("{signal} {value:?} is claimed by both {first} and {second}")]
    Conflict {
        /// Kind of signal (`target prefix`, `path prefix`, ...).
        signal: &'static str,
        /// The contested value.
        value: String,
        /// Service that claimed it first.
        first: String,
        /// Service that claimed it second.
        second: String,
    },
}

/// Insertion-ordered, name-keyed set of services. Read-only once built.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<Arc<dyn MockService>>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// Register `service`, replacing any service already under its name.
    fn insert(&mut self, service: Arc<dyn MockService>) -> Result<(), RegistryError> {
        let name = service.name().to_owned();
        if !is_valid_name(&name) {
            return Err(RegistryError::InvalidName(name));
        }
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(service = %name, "replacing registered service");
                self.services[slot] = service;
            }
            None => {
                self.index.insert(name, self.services.len());
                self.services.push(service);
            }
        }
        Ok(())
    }

    /// The service registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn MockService>> {
        self.index.get(name).map(|&slot| &self.services[slot])
    }

    /// Whether a service is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.name()).collect()
    }

    /// Registered services in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MockService>> {
        self.services.iter()
    }

    /// Number of registered services.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.names())
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Builder for a frozen [`Gateway`].
///
/// ```no_run
/// # use cloudmock_core::CloudMockConfig;
/// # use cloudmock_gateway::GatewayBuilder;
/// let gateway = GatewayBuilder::new(&CloudMockConfig::default())
///     .build()
///     .expect("built-in routes never conflict");
/// ```
#[derive(Default)]
pub struct GatewayBuilder {
    services: Vec<Arc<dyn MockService>>,
    routes: Vec<ServiceRoutes>,
}

impl GatewayBuilder {
    /// Start from the built-in services enabled by `config`.
    #[must_use]
    pub fn new(config: &CloudMockConfig) -> Self {
        Self {
            services: cloudmock_services::builtin_services(config),
            routes: Vec::new(),
        }
    }

    /// Start from no services at all.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register or replace a service under its own name.
    ///
    /// A replacement of a built-in keeps the built-in routes unless
    /// [`with_routes`](Self::with_routes) supplies new ones.
    #[must_use]
    pub fn with_service(mut self, service: Arc<dyn MockService>) -> Self {
        self.services.push(service);
        self
    }

    /// Attach routes to a service name, replacing earlier routes for it.
    #[must_use]
    pub fn with_routes(mut self, routes: ServiceRoutes) -> Self {
        self.routes.push(routes);
        self
    }

    /// Apply every registration in order, validate the routing table, and
    /// freeze the result.
    pub fn build(self) -> Result<Gateway, RegistryError> {
        let mut registry = ServiceRegistry::default();
        for service in self.services {
            registry.insert(service)?;
        }

        let mut explicit: HashMap<String, ServiceRoutes> = HashMap::new();
        for routes in self.routes {
            if !registry.contains(&routes.service) {
                return Err(RegistryError::UnknownService(routes.service));
            }
            if explicit.insert(routes.service.clone(), routes).is_some() {
                debug!("replacing routes supplied earlier");
            }
        }

        let table: Vec<ServiceRoutes> = registry
            .names()
            .into_iter()
            .filter_map(|name| {
                explicit
                    .remove(name)
                    .or_else(|| builtin_routes(name))
            })
            .collect();
        let classifier = Classifier::new(&table)?;

        Ok(Gateway::new(registry, classifier))
    }
}

impl fmt::Debug for GatewayBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.services.iter().map(|s| s.name()).collect();
        f.debug_struct("GatewayBuilder")
            .field("services", &names)
            .field("routes", &self.routes)
            .finish()
    }
}
