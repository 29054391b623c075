use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::task::{self, Poll, ready};
use std::time::Duration;

use chatline_gateway::{
    ChatRole, CompletionEvent, CompletionGateway, CompletionRequest,
    CompletionResponse, ErrorKind, FinishReason, GatewayError,
    SamplingParams,
};
use tokio::time::{Sleep, sleep};

#[derive(Debug)]
struct EchoGatewayError(ErrorKind);

impl Display for EchoGatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Error for EchoGatewayError {}

impl GatewayError for EchoGatewayError {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Debug)]
struct EchoResponse {
    fake_deltas: VecDeque<String>,
    finished: bool,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl EchoResponse {
    fn new(input: &str) -> Self {
        let fake_deltas = format!("You said {}", input)
            .split(" ")
            .map(ToString::to_string)
            .collect();
        Self {
            fake_deltas,
            finished: false,
            sleep: None,
        }
    }
}

impl CompletionResponse for EchoResponse {
    type Error = EchoGatewayError;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<CompletionEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };
        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            if let Some(mut this_delta) = this.fake_deltas.pop_front() {
                let need_space = !this.fake_deltas.is_empty();
                if need_space {
                    this_delta.push(' ');
                }
                return Poll::Ready(Ok(Some(CompletionEvent::TextDelta(
                    this_delta,
                ))));
            }

            if !this.finished {
                this.finished = true;
                return Poll::Ready(Ok(Some(CompletionEvent::Completed(
                    FinishReason::Stop,
                ))));
            }

            return Poll::Ready(Ok(None));
        }
        this.sleep = Some(Box::pin(sleep(Duration::from_millis(1))));
        Pin::new(this).poll_next_event(cx)
    }
}

struct EchoGateway;

impl CompletionGateway for EchoGateway {
    type Error = EchoGatewayError;
    type Response = EchoResponse;

    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let result = 'blk: {
            let Some(msg) = req
                .messages
                .iter()
                .rev()
                .find(|msg| msg.role() == ChatRole::User)
            else {
                break 'blk Err(EchoGatewayError(ErrorKind::Other));
            };

            Ok(EchoResponse::new(msg.content()))
        };
        ready(result)
    }
}

mod tests {
    use std::future::poll_fn;

    use chatline_gateway::ChatMessage;

    use super::*;

    #[tokio::test]
    async fn test_completion() {
        let gateway = EchoGateway;
        let req = CompletionRequest {
            messages: vec![
                ChatMessage::system("You echo things."),
                ChatMessage::user("Good morning"),
            ],
            sampling: SamplingParams::for_model("echo"),
        };
        let mut resp = gateway.send_request(&req).await.unwrap();

        let mut reply = String::new();
        let mut finish_reason = None;
        loop {
            let resp_fut =
                poll_fn(|cx| Pin::new(&mut resp).poll_next_event(cx));
            match resp_fut.await {
                Ok(Some(event)) => match event {
                    CompletionEvent::TextDelta(delta) => {
                        reply.push_str(&delta);
                    }
                    CompletionEvent::Completed(reason) => {
                        finish_reason = Some(reason);
                    }
                },
                Ok(None) => break,
                Err(err) => unreachable!("unexpected error: {err:?}"),
            }
        }

        assert_eq!(reply, "You said Good morning");
        assert_eq!(finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn test_error() {
        let gateway = EchoGateway;
        let req = CompletionRequest {
            messages: vec![],
            sampling: SamplingParams::for_model("echo"),
        };
        let result = gateway.send_request(&req).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Other);
    }
}
