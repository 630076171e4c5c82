//! Registration dialog state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub mod transition;


pub use effect::{Effect, Reply};
pub use event::{Command, Event};
pub use state::{DialogContext, DialogState};
pub use transition::{transition, TransitionError, TransitionResult};
