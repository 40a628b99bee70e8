//! # rackcloud-core
//!
//! Core types and request dispatch for the Rackspace Cloud v1.0 APIs.
//!
//! This crate provides the error type, configuration, authentication and the
//! single [`Dispatcher`] shared by the compute, load-balancer and DNS clients.
//!
//! ## Modules
//!
//! - [`error`] - Error types and the crate-wide `Result`
//! - [`ids`] - Strongly-typed numeric identifiers
//! - [`types`] - Sub-service targets and regions
//! - [`config`] - Configuration structures for cloud clients
//! - [`client`] - HTTP transport settings
//! - [`auth`] - Credentials, sessions and the v1.0 handshake
//! - [`dispatch`] - The request dispatcher and its outcome type
//! - [`macros`] - Closed provider enumerations
//! - [`naming`] - Name sanitization and duplicate detection
//! - [`query`] - Query parameter builder

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod ids;
pub mod macros;
pub mod naming;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use auth::{Endpoints, PasswordAuth, Session, SessionProvider, StaticSession};
pub use config::CloudConfig;
pub use dispatch::{DispatchOutcome, Dispatcher, RequestSpec};
pub use error::{Error, Result};
pub use types::{Region, ServiceTarget};
