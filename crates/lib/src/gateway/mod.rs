//! Gateway: HTTP boundary in front of the message pipeline.
//!
//! `POST /chat` runs one message through the pipeline; `GET /` is a health probe.
//! Pipeline failures become `500 { detail }` here and nowhere else.

mod protocol;
mod server;

pub use protocol::{ApiError, ErrorBody};
pub use server::{router, run_gateway, serve, GatewayState};
