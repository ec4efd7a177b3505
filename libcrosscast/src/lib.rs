//! Crosscast - compose once, publish everywhere
//!
//! This library validates a draft post against thirteen social
//! platforms' publishing rules, dispatches it through a distribution
//! gateway, and polls until every share settles with a public URL.

pub mod config;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod platform;
pub mod probe;
pub mod rules;
pub mod settle;
pub mod types;
pub mod validate;

// Re-export commonly used types
pub use config::Config;
pub use db::Database;
pub use dispatch::Dispatcher;
pub use error::{CrosscastError, Result};
pub use gateway::{Gateway, HttpGateway, MockGateway};
pub use platform::PlatformId;
pub use settle::Settler;
pub use types::{Draft, Post, ShareRecord, ShareStatus};
pub use validate::{ValidationEngine, ValidationReport};
