//! HTTP API handlers for trackpd-report

pub mod health;
pub mod report;

pub use health::health_routes;
pub use report::report_routes;
