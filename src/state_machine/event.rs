//! Events that can occur in a dialog

use crate::db::KeyColumn;

/// Bot commands, sent as `/name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    ListAll,
    AddGroup,
    Cancel,
    Help,
    About,
}

impl Command {
    /// Every command the bot answers to
    pub const ALL: [Command; 6] = [
        Command::Start,
        Command::ListAll,
        Command::AddGroup,
        Command::Cancel,
        Command::Help,
        Command::About,
    ];

    /// Look up a command by its exact, case-sensitive name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::ListAll => "list_all",
            Command::AddGroup => "add_group",
            Command::Cancel => "cancel",
            Command::Help => "help",
            Command::About => "about",
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    Command(Command),
    Text(String),

    // Store outcomes of a `RegisterGroup` effect
    RegistrationAccepted,
    RegistrationRejected { column: KeyColumn },
}
