//! # TrackPD Common Library
//!
//! Shared code for the TrackPD microservices:
//! - Document store client and credential loading
//! - Record models and store field names
//! - Configuration loading
//! - Capture-time stamping

pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod time;

pub use error::{Error, Result};
pub use models::Document;
pub use store::{StoreClient, StoreCredentials};
