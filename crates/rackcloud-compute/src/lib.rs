//! Cloud Servers client and data models.
//!
//! Provides strongly typed models and an asynchronous client for servers,
//! flavors, images, shared IP groups and backup schedules.

#![deny(missing_docs)]

pub mod client;
pub mod models;

pub use client::ServersClient;
pub use models::{
    AddressKind, Addresses, BackupSchedule, CreateServerRequest, DailyBackup, Flavor, Image,
    Limits, PersonalityFile, RateLimit, RebootType, Server, SharedIpGroup, UpdateServerRequest,
    WeeklyBackup,
};

/// Convenient result alias using the shared error type.
pub type Result<T> = rackcloud_core::Result<T>;
