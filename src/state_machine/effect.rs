//! Effects produced by state transitions

use crate::db::ModRegistration;

/// Canned responses sent back to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Help,
    About,
    PromptCode,
    PromptUrl,
    InvalidCode,
    InvalidUrl,
    Registered,
    CodeTaken,
    UrlTaken,
    NothingToCancel,
    Cancelled,
    ListEmpty,
}

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Persist the new state
    PersistState,

    /// Make sure the user has a stored row
    EnsureUser,

    /// Send a canned response
    Reply(Reply),

    /// Send every registration, split into transport-sized messages
    SendListing,

    /// Insert the registration; the store's verdict comes back as an event
    RegisterGroup { registration: ModRegistration },
}
