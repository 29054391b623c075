//! The outbound messaging boundary.

use std::error::Error;
use std::fmt::{self, Display};

use async_trait::async_trait;

/// The error returned when a transport fails to deliver a message.
#[derive(Debug)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Creates an error with the given description.
    #[inline]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for TransportError {}

/// Outbound side of the messaging transport.
///
/// The inbound side is not modeled here: whoever drives the transport
/// (a messaging-client session, the CLI loop, a test) forwards received
/// events to the router directly. The transport never touches
/// conversation state.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a text message to the recipient.
    async fn send_text(
        &self,
        recipient: &str,
        text: &str,
    ) -> Result<(), TransportError>;
}
