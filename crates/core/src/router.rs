mod builder;
mod state;

use chatline_actor::Actor;
use chatline_gateway::ChatMessage;
use tokio::sync::oneshot;

pub use builder::{ChatBehavior, RouterBuilder};
use state::{InboundText, IncomingCall, ReadConversation, RouterState};

/// Routes inbound chat events between the transport, the conversation
/// store, and the completion gateway.
///
/// The router is an actor: every read-modify-write of the conversation
/// store happens inside its single-threaded message loop, which
/// serializes access per conversation (and across conversations — the
/// store operations are plain in-memory work). The only long-running
/// operation, the gateway call, runs in a spawned task holding nothing
/// but a history snapshot, so completions for distinct conversations
/// proceed in parallel and a slow endpoint never blocks the mailbox.
/// The assistant reply re-enters the mailbox to be appended and
/// delivered.
pub struct Router {
    handle: Actor<RouterState>,
}

impl Router {
    /// Feeds an inbound text message from `sender`.
    pub fn handle_text<S, T>(&self, sender: S, text: T)
    where
        S: Into<String>,
        T: Into<String>,
    {
        self.handle
            .send(InboundText {
                sender: sender.into(),
                text: text.into(),
            })
            .expect("router task has been dropped too early");
    }

    /// Reports an incoming voice call, which is answered with the
    /// configured reject message.
    pub fn handle_incoming_call<S: Into<String>>(&self, caller: S) {
        self.handle
            .send(IncomingCall {
                caller: caller.into(),
            })
            .expect("router task has been dropped too early");
    }

    /// Returns an independent copy of the history backing `sender`'s
    /// conversation, or `None` if no message has been exchanged yet.
    pub async fn read_conversation(
        &self,
        sender: &str,
    ) -> Option<Vec<ChatMessage>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.handle
            .send(ReadConversation {
                conversation_id: conversation_id(sender),
                reply_tx,
            })
            .ok()?;
        reply_rx.await.ok().flatten()
    }
}

impl Clone for Router {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl Router {
    fn spawn_from_builder(builder: RouterBuilder) -> Self {
        let RouterBuilder {
            gateway,
            transport,
            sampling,
            behavior,
            store,
            on_idle,
        } = builder;

        let state = RouterState {
            store,
            gateway,
            transport,
            sampling,
            behavior,
            running_tasks: Default::default(),
            next_task_id: 1,
            on_idle,
        };
        Self {
            handle: Actor::spawn(state, Some("router")),
        }
    }
}

/// Derives the conversation id for a sender, so repeated contacts from
/// the same identity reuse the same history.
#[inline]
fn conversation_id(sender: &str) -> String {
    format!("im:{sender}")
}
