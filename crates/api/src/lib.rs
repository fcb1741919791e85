//! HTTP API: session hand-off, enforcement gate, and the reference routes.

pub mod app;
pub mod context;
pub mod gate;
pub mod middleware;
