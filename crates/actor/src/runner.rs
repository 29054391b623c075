use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, watch};

use crate::Actor;
use crate::mailbox::{Envelope, Mailbox};

pub(crate) async fn run_actor<S: Send + Sync + 'static>(
    mailbox: Weak<Mailbox<S>>,
    mut state: S,
    mut msg_rx: mpsc::UnboundedReceiver<Envelope<S>>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let envelope = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            envelope = msg_rx.recv() => {
                let Some(envelope) = envelope else {
                    break;
                };
                envelope
            }
        };
        trace!("received message: {}", envelope.label);

        {
            let Some(mailbox) = mailbox.upgrade() else {
                warn!("last mailbox has been dropped, discard the message");
                break;
            };

            let proc_span = trace_span!("proc msg", label = envelope.label);
            proc_span.in_scope(|| {
                (envelope.apply)(&mut state, &Actor::from_mailbox(mailbox));
                trace!("finished");
            });
        }
    }
    debug!("will terminate");
}
