//! Core logic for the chat bridge: the conversation store, the gateway
//! client, and the message router.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod gateway_client;
pub mod history;
mod router;
pub mod store;
pub mod transport;

pub use gateway_client::{GatewayClient, Reply};
pub use router::{ChatBehavior, Router, RouterBuilder};
