use std::collections::HashMap;
use std::sync::Arc;

use chatline_actor::{Actor, Message};
use chatline_gateway::{
    ChatMessage, CompletionRequest, GatewayError, SamplingParams,
};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::ChatBehavior;
use crate::gateway_client::{GatewayClient, Reply};
use crate::store::ConversationStore;
use crate::transport::Transport;

pub(crate) struct RouterState {
    pub(crate) store: ConversationStore,
    pub(crate) gateway: GatewayClient,
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) sampling: SamplingParams,
    pub(crate) behavior: ChatBehavior,
    pub(crate) running_tasks: HashMap<u64, JoinHandle<()>>,
    pub(crate) next_task_id: u64,

    pub(crate) on_idle: Option<Box<dyn Fn() + Send + Sync>>,
}

impl RouterState {
    fn inbound_text(
        &mut self,
        sender: String,
        text: String,
        handle: &Actor<Self>,
    ) {
        if let Some(reply) = self.behavior.greeting_reply_for(&text) {
            debug!("answering a greeting from {sender}");
            let reply = reply.to_owned();
            self.send_text(sender, reply, handle);
            return;
        }

        let conversation_id = super::conversation_id(&sender);

        // Passing the instruction on every call is harmless: the store
        // only applies it when the conversation is created.
        let messages = self.store.add_user_message(
            &conversation_id,
            &text,
            Some(self.behavior.system_instruction.as_str()),
        );

        let request = CompletionRequest {
            messages,
            sampling: self.sampling.clone(),
        };
        let gateway = self.gateway.clone();
        let handle_clone = handle.clone();
        self.spawn_task(
            |_| async move {
                let result = gateway.complete(request).await;

                handle_clone
                    .send(CompletionFinished {
                        conversation_id,
                        sender,
                        result,
                    })
                    .ok();
            },
            handle,
        );
    }

    fn completion_finished(
        &mut self,
        conversation_id: String,
        sender: String,
        result: Result<Reply, Box<dyn GatewayError>>,
        handle: &Actor<Self>,
    ) {
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => {
                warn!("completion failed for {sender}: {err}");
                let fallback = self.behavior.fallback_reply.clone();
                self.send_text(sender, fallback, handle);
                return;
            }
        };

        // The user message was appended before the gateway call; the
        // assistant record re-enters store serialization here.
        self.store.add_assistant_message(&conversation_id, &reply.text);
        self.send_text(sender, reply.text, handle);
    }

    fn incoming_call(&mut self, caller: String, handle: &Actor<Self>) {
        info!("rejecting an incoming call from {caller}");
        let reply = self.behavior.call_reject_reply.clone();
        self.send_text(caller, reply, handle);
    }

    fn send_text(
        &mut self,
        recipient: String,
        text: String,
        handle: &Actor<Self>,
    ) {
        let transport = Arc::clone(&self.transport);
        self.spawn_task(
            |_| async move {
                if let Err(err) = transport.send_text(&recipient, &text).await
                {
                    error!("failed to deliver a reply to {recipient}: {err}");
                }
            },
            handle,
        );
    }

    fn spawn_task<F, Fut>(&mut self, f: F, handle: &Actor<Self>)
    where
        F: FnOnce(u64) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task_id = self.next_task_id;
        self.next_task_id += 1;

        let handle = handle.clone();
        let fut = f(task_id);
        let task = tokio::spawn(async move {
            fut.await;
            handle.send(TaskEndedMessage(task_id)).ok();
        });
        self.running_tasks.insert(task_id, task);
    }

    fn notify_if_idle(&self) {
        if !self.running_tasks.is_empty() {
            return;
        }
        if let Some(on_idle) = &self.on_idle {
            on_idle();
        }
    }
}

pub(crate) struct InboundText {
    pub(crate) sender: String,
    pub(crate) text: String,
}

impl Message<RouterState> for InboundText {
    fn handle(self, state: &mut RouterState, handle: &Actor<RouterState>) {
        state.inbound_text(self.sender, self.text, handle);
    }
}

pub(crate) struct IncomingCall {
    pub(crate) caller: String,
}

impl Message<RouterState> for IncomingCall {
    fn handle(self, state: &mut RouterState, handle: &Actor<RouterState>) {
        state.incoming_call(self.caller, handle);
    }
}

pub(crate) struct ReadConversation {
    pub(crate) conversation_id: String,
    pub(crate) reply_tx: oneshot::Sender<Option<Vec<ChatMessage>>>,
}

impl Message<RouterState> for ReadConversation {
    fn handle(self, state: &mut RouterState, _handle: &Actor<RouterState>) {
        self.reply_tx
            .send(state.store.read(&self.conversation_id))
            .ok();
    }
}

struct CompletionFinished {
    conversation_id: String,
    sender: String,
    result: Result<Reply, Box<dyn GatewayError>>,
}

impl Message<RouterState> for CompletionFinished {
    fn handle(self, state: &mut RouterState, handle: &Actor<RouterState>) {
        state.completion_finished(
            self.conversation_id,
            self.sender,
            self.result,
            handle,
        );
    }
}

struct TaskEndedMessage(u64);

impl Message<RouterState> for TaskEndedMessage {
    #[inline]
    fn handle(self, state: &mut RouterState, _handle: &Actor<RouterState>) {
        state
            .running_tasks
            .remove(&self.0)
            .expect("internal state is inconsistent");
        state.notify_if_idle();
    }
}
