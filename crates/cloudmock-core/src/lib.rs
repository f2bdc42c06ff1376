//! Core types, configuration, and resource stores for CloudMock.
//!
//! This crate provides the building blocks shared by the gateway and every
//! mock service: environment-driven configuration, account and region
//! identifiers, ARN formatting, and [`ResourceStore`], the guarded container
//! each service keeps its resources in.

mod config;
mod error;
mod store;
mod types;

pub use config::{CloudMockConfig, parse_services};
pub use error::{CloudMockError, CloudMockResult};
pub use store::{ResourceStore, StoreError};
pub use types::{AccountId, AwsRegion, arn};
