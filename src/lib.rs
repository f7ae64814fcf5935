//! Diplomatic travel reporting: load the COLT travel table, aggregate it,
//! render charts and documents, assemble a dashboard, and serve the result.

pub mod aggregate;
pub mod artifact;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod logging;
pub mod palette;
pub mod pipeline;
pub mod relocate;
pub mod render;
pub mod server;
