//! Service registry, request classifier and dispatcher for CloudMock.
//!
//! A [`GatewayBuilder`] collects services and their routes, validates the
//! routing table, and freezes both into a [`Gateway`]. The gateway is a hyper
//! service: it classifies every request by generic signals (target header,
//! path prefix, host, credential scope, Query action), forwards it to exactly
//! one registered service, and frames a protocol-appropriate not-found error
//! when no service claims it.
//!
//! ```no_run
//! # async fn run() -> std::io::Result<()> {
//! use cloudmock_core::CloudMockConfig;
//! use cloudmock_gateway::{Gateway, MockServer};
//!
//! let gateway = Gateway::builder(&CloudMockConfig::default())
//!     .build()
//!     .expect("built-in routes never conflict");
//! let server = MockServer::start(gateway).await?;
//! println!("endpoint: {}", server.url());
//!
//! server.gateway().reset_all().ok();
//! server.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod dispatcher;
pub mod registry;
pub mod reset;
pub mod routes;
pub mod server;

pub use classifier::{Classification, ClassifyError, MatchSignal};
pub use dispatcher::{Gateway, GatewayResponse, VERSION};
pub use registry::{GatewayBuilder, RegistryError, ServiceRegistry};
pub use reset::ResetFailure;
pub use routes::{ServiceRoutes, builtin_routes};
pub use server::{MockServer, serve};
