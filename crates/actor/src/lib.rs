//! A lightweight actor runtime.
//!
//! An actor owns a piece of mutable state and processes messages from
//! its mailbox one at a time, so the state is never observed mid-update.
//! Handles are cheap to clone and can be sent across tasks.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod error;
mod handle;
mod mailbox;
mod runner;

pub use error::ActorDeadError;
pub use handle::Actor;
pub use mailbox::Message;

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[derive(Default)]
    struct CounterState {
        value: u32,
    }

    struct AddMessage(u32);

    impl Message<CounterState> for AddMessage {
        fn handle(
            self,
            state: &mut CounterState,
            _handle: &Actor<CounterState>,
        ) {
            state.value += self.0;
        }
    }

    struct GetMessage(oneshot::Sender<u32>);

    impl Message<CounterState> for GetMessage {
        fn handle(
            self,
            state: &mut CounterState,
            _handle: &Actor<CounterState>,
        ) {
            self.0.send(state.value).unwrap();
        }
    }

    struct ForwardMessage(oneshot::Sender<u32>);

    impl Message<CounterState> for ForwardMessage {
        fn handle(
            self,
            _state: &mut CounterState,
            handle: &Actor<CounterState>,
        ) {
            // Messages sent from within a handler are processed after
            // the current one.
            handle.send(GetMessage(self.0)).unwrap();
        }
    }

    #[tokio::test]
    async fn test_send_message() {
        let actor = Actor::spawn(CounterState::default(), Some("counter"));
        actor.send(AddMessage(40)).unwrap();
        actor.send(AddMessage(2)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(GetMessage(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_send_from_handler() {
        let actor = Actor::spawn(CounterState::default(), None);
        actor.send(AddMessage(7)).unwrap();

        let (tx, rx) = oneshot::channel();
        actor.send(ForwardMessage(tx)).unwrap();
        assert_eq!(rx.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_try_kill() {
        let actor = Actor::spawn(CounterState::default(), None);
        actor.try_kill();

        // The run loop drops its receiver once it observes the kill
        // flag, after which sends start to fail.
        while actor.send(AddMessage(1)).is_ok() {
            tokio::task::yield_now().await;
        }
    }
}
