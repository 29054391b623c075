use std::error::Error;

use crate::error::ErrorKind;
use crate::request::CompletionRequest;
use crate::response::CompletionResponse;

/// The error type for a completion gateway.
pub trait GatewayError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a completion gateway: given an ordered message
/// history and sampling parameters, it produces one generated reply.
///
/// Once the gateway is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not rely
/// on it, and the gateway should be prepared for being dropped anytime.
pub trait CompletionGateway: Send + Sync {
    /// The error type that may be returned by the gateway.
    type Error: GatewayError;

    /// The response type for this gateway.
    type Response: CompletionResponse<Error = Self::Error>;

    /// Sends a request to the completion endpoint.
    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static;
}
