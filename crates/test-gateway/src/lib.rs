//! A scripted fake completion gateway for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use chatline_gateway::{
    CompletionEvent, CompletionGateway, CompletionRequest,
    CompletionResponse, ErrorKind, GatewayError,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    #[allow(dead_code)]
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

impl StdError for Error {}

impl GatewayError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct ScriptedResponse {
    reply: PresetReply,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl CompletionResponse for ScriptedResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<CompletionEvent>, Self::Error>> {
        // SAFETY: This type does not require to be pinned.
        let this = unsafe { self.get_unchecked_mut() };

        if let Some(sleep) = &mut this.sleep {
            let sleep = sleep.as_mut();
            ready!(sleep.poll(cx));
            this.sleep = None;

            let deltas = &this.reply.deltas;
            if this.event_idx < deltas.len() {
                let event =
                    CompletionEvent::TextDelta(deltas[this.event_idx].clone());
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(event)));
            } else if this.event_idx == deltas.len() {
                this.event_idx += 1;
                return Poll::Ready(Ok(Some(CompletionEvent::Completed(
                    this.reply.finish_reason,
                ))));
            } else {
                // In case this method is called after completion.
                return Poll::Ready(Ok(None));
            }
        }
        this.sleep = Some(Box::pin(sleep(this.delay)));
        Pin::new(this).poll_next_event(cx)
    }
}

#[derive(Clone)]
enum ScriptStep {
    History,
    Reply(PresetReply),
}

/// A scripted fake completion gateway.
///
/// Before sending requests, you need to setup the conversation script,
/// which is how the gateway should respond to a request. The steps are
/// selected according to the number of history messages in the request:
/// every history record (system instruction or user input) occupies one
/// step, and the step right after the last record must be a reply step.
/// If there is no matching step in the script, an error is returned.
///
/// A reply step with a failure budget rejects its first attempts with a
/// rate-limit error, which is how the retry path is exercised in tests.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    script: Vec<ScriptStep>,
    failures_left: Arc<Mutex<HashMap<usize, u64>>>,
    delay: Option<Duration>,
}

impl ScriptedGateway {
    /// Adds a step occupied by a history record.
    #[inline]
    pub fn add_history_step(&mut self) {
        self.script.push(ScriptStep::History);
    }

    /// Adds a reply step.
    #[inline]
    pub fn add_reply_step(&mut self, reply: PresetReply) {
        self.script.push(ScriptStep::Reply(reply));
    }

    /// Sets the delay between streamed events.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    fn check_failure_budget(&self, step_idx: usize, reply: &PresetReply) -> bool {
        let Some(failures) = reply.failures else {
            return false;
        };
        if failures == 0 {
            return true;
        }
        let mut failures_left = self.failures_left.lock().unwrap();
        let left = failures_left.entry(step_idx).or_insert(failures);
        if *left > 0 {
            *left -= 1;
            true
        } else {
            false
        }
    }
}

impl CompletionGateway for ScriptedGateway {
    type Error = crate::Error;
    type Response = ScriptedResponse;

    fn send_request(
        &self,
        req: &CompletionRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        let step_idx = req.messages.len();
        let result = 'blk: {
            let Some(step) = self.script.get(step_idx) else {
                break 'blk Err(Error {
                    message: "no more scripted steps",
                    kind: ErrorKind::Other,
                });
            };
            let ScriptStep::Reply(reply) = step else {
                break 'blk Err(Error {
                    message: "not a reply step",
                    kind: ErrorKind::Other,
                });
            };
            if self.check_failure_budget(step_idx, reply) {
                break 'blk Err(Error {
                    message: "throttled by script",
                    kind: ErrorKind::RateLimited,
                });
            }
            Ok(ScriptedResponse {
                reply: reply.clone(),
                event_idx: 0,
                delay: self.delay.unwrap_or(Duration::from_millis(1)),
                sleep: None,
            })
        };
        ready(result)
    }
}
