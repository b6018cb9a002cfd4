//! HTTP surface for fetcharr: router, handlers and shared state.

pub mod api;
pub mod metrics;
pub mod state;
