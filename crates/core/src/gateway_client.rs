use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use chatline_gateway::{
    CompletionEvent, CompletionGateway, CompletionRequest,
    CompletionResponse, ErrorKind, FinishReason, GatewayError,
};
use tracing::Instrument;

type CompleteResult = Result<Reply, Box<dyn GatewayError>>;
type BoxedCompleteFuture = Pin<Box<dyn Future<Output = CompleteResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(CompletionRequest) -> BoxedCompleteFuture + Send + Sync
>;

/// A wrapper around a completion gateway that drives streamed responses
/// to completion and provides a type-erased interface for the other
/// modules.
#[derive(Clone)]
pub struct GatewayClient {
    handler_fn: HandlerFn,
}

impl GatewayClient {
    /// Wraps the given gateway.
    #[inline]
    pub fn new<G: CompletionGateway + 'static>(gateway: G) -> Self {
        // We have to erase the type `G`, since `GatewayClient` doesn't
        // have a generic parameter and we don't want it either.
        let gateway = Arc::new(gateway);
        let handler_fn: HandlerFn = Arc::new(move |req| {
            let gateway = Arc::clone(&gateway);
            Box::pin(
                async move {
                    trace!("got a request: {:?}", req);
                    complete_with_retry(&*gateway, &req, default_backoff())
                        .await
                }
                .instrument(trace_span!("gateway client req")),
            )
        });
        Self { handler_fn }
    }

    /// Sends a request and returns the fully assembled reply.
    ///
    /// Rate-limit failures are retried with exponential backoff until
    /// they clear or the retry window closes; any other failure is
    /// returned to the caller immediately.
    #[inline]
    pub async fn complete(&self, req: CompletionRequest) -> CompleteResult {
        (self.handler_fn)(req).await
    }
}

/// A completely received reply from the gateway.
#[derive(Clone, Debug)]
pub struct Reply {
    /// The assembled reply text.
    pub text: String,
    /// The reason the model finished generating.
    pub finish_reason: Option<FinishReason>,
}

fn default_backoff() -> ExponentialBackoff {
    ExponentialBackoff {
        initial_interval: Duration::from_millis(250),
        max_elapsed_time: Some(Duration::from_secs(30)),
        ..Default::default()
    }
}

async fn complete_with_retry<G: CompletionGateway>(
    gateway: &G,
    req: &CompletionRequest,
    backoff: ExponentialBackoff,
) -> CompleteResult {
    backoff::future::retry(backoff, || async {
        match gateway.send_request(req).await {
            Ok(resp) => collect_reply::<G>(resp).await.map_err(classify::<G>),
            Err(err) => Err(classify::<G>(err)),
        }
    })
    .await
}

fn classify<G: CompletionGateway>(
    err: G::Error,
) -> backoff::Error<Box<dyn GatewayError>> {
    let kind = err.kind();
    let err: Box<dyn GatewayError> = Box::new(err);
    if kind == ErrorKind::RateLimited {
        warn!("gateway rate limited, will retry: {err}");
        backoff::Error::transient(err)
    } else {
        error!("got an error: {err}");
        backoff::Error::permanent(err)
    }
}

async fn collect_reply<G: CompletionGateway>(
    resp: G::Response,
) -> Result<Reply, G::Error> {
    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await?;
        let Some(event) = event else {
            break;
        };
        trace!("got an event: {event:?}");

        match event {
            CompletionEvent::TextDelta(delta) => {
                text.push_str(&delta);
            }
            CompletionEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    Ok(Reply {
        text,
        finish_reason,
    })
}

#[cfg(test)]
mod tests {
    use chatline_gateway::{ChatMessage, SamplingParams};
    use chatline_test_gateway::{PresetReply, ScriptedGateway};

    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("Hi")],
            sampling: SamplingParams::for_model("scripted"),
        }
    }

    #[tokio::test]
    async fn test_complete() {
        let mut gateway = ScriptedGateway::default();
        gateway.add_history_step();
        gateway.add_reply_step(PresetReply::with_deltas([
            "How ", "are ", "you?",
        ]));

        let client = GatewayClient::new(gateway);

        for _ in 0..3 {
            let reply = client.complete(request()).await.unwrap();
            assert_eq!(reply.text, "How are you?");
            assert_eq!(reply.finish_reason, Some(FinishReason::Stop));
        }
    }

    #[tokio::test]
    async fn test_permanent_error() {
        let gateway = ScriptedGateway::default();
        let client = GatewayClient::new(gateway);

        let err = client.complete(request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_rate_limit() {
        let mut gateway = ScriptedGateway::default();
        gateway.add_history_step();
        gateway.add_reply_step(
            PresetReply::with_deltas(["Back ", "online."]).with_failures(2),
        );

        let client = GatewayClient::new(gateway);

        let reply = client.complete(request()).await.unwrap();
        assert_eq!(reply.text, "Back online.");
    }

    #[tokio::test]
    async fn test_retry_gives_up_eventually() {
        let mut gateway = ScriptedGateway::default();
        gateway.add_history_step();
        gateway.add_reply_step(
            PresetReply::with_deltas(["Never."]).with_failures(0),
        );

        // A tight retry window keeps the test quick.
        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_millis(1),
            max_elapsed_time: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let err = complete_with_retry(&gateway, &request(), backoff)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }
}
