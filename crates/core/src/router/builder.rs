use std::sync::Arc;

use chatline_gateway::{CompletionGateway, SamplingParams};

use super::Router;
use crate::gateway_client::GatewayClient;
use crate::store::ConversationStore;
use crate::transport::Transport;

/// Behavior knobs for the router.
#[derive(Clone, Debug)]
pub struct ChatBehavior {
    /// Instruction seeded as the system record of new conversations.
    /// Leave empty to run without a system record.
    pub system_instruction: String,
    /// Reply sent to the user when the completion gateway fails.
    pub fallback_reply: String,
    /// Inbound texts answered with `greeting_reply` directly, without
    /// involving the gateway or the history. Compared case-insensitively
    /// against the trimmed text.
    pub greeting_words: Vec<String>,
    /// The canned reply for greetings.
    pub greeting_reply: String,
    /// Reply sent to a caller when rejecting an incoming voice call.
    pub call_reject_reply: String,
}

impl Default for ChatBehavior {
    fn default() -> Self {
        Self {
            system_instruction: String::new(),
            fallback_reply: "Sorry, I can't answer right now. Please try \
                             again in a moment."
                .to_owned(),
            greeting_words: ["hi", "hello", "hey"]
                .map(String::from)
                .to_vec(),
            greeting_reply: "Hello! How can I help you?".to_owned(),
            call_reject_reply: "Sorry, I can't take calls. Send me a text \
                                message instead."
                .to_owned(),
        }
    }
}

impl ChatBehavior {
    pub(crate) fn greeting_reply_for(&self, text: &str) -> Option<&str> {
        let text = text.trim();
        let is_greeting = self
            .greeting_words
            .iter()
            .any(|word| word.eq_ignore_ascii_case(text));
        is_greeting.then_some(self.greeting_reply.as_str())
    }
}

/// [`Router`] builder.
pub struct RouterBuilder {
    pub(crate) gateway: GatewayClient,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) sampling: SamplingParams,
    pub(crate) behavior: ChatBehavior,
    pub(crate) store: ConversationStore,
    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl RouterBuilder {
    /// Creates a builder with the completion gateway, the transport,
    /// and the sampling parameters every completion request carries.
    pub fn new<G, T>(gateway: G, transport: T, sampling: SamplingParams) -> Self
    where
        G: CompletionGateway + 'static,
        T: Transport + 'static,
    {
        Self {
            gateway: GatewayClient::new(gateway),
            transport: Arc::new(transport),
            sampling,
            behavior: ChatBehavior::default(),
            store: ConversationStore::new(),
            on_idle: None,
        }
    }

    /// Sets the chat behavior.
    #[inline]
    pub fn with_behavior(mut self, behavior: ChatBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// Injects a conversation store, e.g. one with a custom message
    /// limit. By default the router owns a fresh store.
    #[inline]
    pub fn with_store(mut self, store: ConversationStore) -> Self {
        self.store = store;
        self
    }

    /// Attaches a callback to be invoked whenever the router runs out
    /// of in-flight work (no gateway call or outbound delivery left).
    #[inline]
    pub fn on_idle(
        mut self,
        on_idle: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Builds the router.
    #[inline]
    pub fn build(self) -> Router {
        Router::spawn_from_builder(self)
    }
}
