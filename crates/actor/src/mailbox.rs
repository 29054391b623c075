use tokio::sync::{mpsc, watch};

use crate::{Actor, ActorDeadError};

/// The message that an actor can handle.
pub trait Message<S>: Send + 'static {
    /// Handles the message with mutable access to the actor's state.
    fn handle(self, state: &mut S, handle: &Actor<S>);
}

/// A type-erased message, ready to be applied to the state.
pub(crate) struct Envelope<S> {
    pub(crate) label: &'static str,
    pub(crate) apply: Box<dyn FnOnce(&mut S, &Actor<S>) + Send>,
}

pub(crate) struct MailboxParts<S> {
    pub(crate) mailbox: Mailbox<S>,
    pub(crate) msg_rx: mpsc::UnboundedReceiver<Envelope<S>>,
    pub(crate) kill_rx: watch::Receiver<bool>,
}

pub(crate) struct Mailbox<S> {
    msg_tx: mpsc::UnboundedSender<Envelope<S>>,
    kill_tx: watch::Sender<bool>,
}

impl<S: Send + Sync + 'static> Mailbox<S> {
    #[inline]
    pub(crate) fn new() -> MailboxParts<S> {
        let (msg_tx, msg_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { msg_tx, kill_tx },
            msg_rx,
            kill_rx,
        }
    }

    #[inline]
    pub(crate) fn send(
        &self,
        envelope: Envelope<S>,
    ) -> Result<(), ActorDeadError> {
        self.msg_tx.send(envelope).map_err(|_| ActorDeadError)
    }

    #[inline]
    pub(crate) fn try_kill(&self) {
        self.kill_tx.send(true).ok();
    }
}
