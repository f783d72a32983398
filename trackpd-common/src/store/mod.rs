//! Document store access
//!
//! The store keeps JSON documents grouped in collections, addressed the way a
//! hosted document database addresses them: a collection path (`tremors`,
//! `users/<id>/activity`) plus a document id. Traversal order is insertion
//! order.

pub mod client;
pub mod credentials;

pub use client::{subcollection_path, StoreClient};
pub use credentials::StoreCredentials;
