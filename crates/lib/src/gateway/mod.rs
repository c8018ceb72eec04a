//! Gateway: HTTP webhook receiver.
//!
//! Single port. `POST /invoke` takes a gateway envelope, `POST /line/webhook` takes LINE's native
//! body and wraps it. Both answer 200 with a fixed body regardless of what processing does.

mod server;

pub use server::{build_router, run_gateway, GatewayState, INLINE_ACK_BODY};
