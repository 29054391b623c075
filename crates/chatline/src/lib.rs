//! An out-of-the-box chat bot that bridges an instant-messaging
//! transport to an OpenAI-compatible completion endpoint.
//!
//! The crate includes a CLI chat loop for talking to the bot in the
//! terminal. And you can also use it as a library to embed the bridge
//! into your own host apps, wiring a real messaging transport in place
//! of the console one.

#![deny(missing_docs)]

mod config;
mod console;

pub use config::{AppConfig, ChatConfig, ConfigError, GatewayConfig};
pub use console::ConsoleTransport;

/// Re-exports of [`chatline_core`] crate.
pub mod core {
    pub use chatline_core::*;
}
