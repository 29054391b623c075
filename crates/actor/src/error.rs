use std::error::Error;
use std::fmt;

/// The error returned when sending a message to an actor whose run
/// loop has already terminated.
#[derive(Debug)]
pub struct ActorDeadError;

impl fmt::Display for ActorDeadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "the actor is no longer running".fmt(f)
    }
}

impl Error for ActorDeadError {}
