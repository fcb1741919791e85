use axum::{middleware, routing::MethodRouter};

use crate::gate::{self, Gate};

/// Wrap `route` so `gate` runs before its handler.
pub fn gated(route: MethodRouter, gate: Gate) -> MethodRouter {
    route.route_layer(middleware::from_fn_with_state(gate, gate::enforce))
}
