//! Pure state transition function
//!
//! Covers the `add_group` registration dialog, cancellation, and the
//! state-independent commands.

use super::{Command, DialogContext, DialogState, Effect, Event, Reply};
use crate::db::{KeyColumn, ModRegistration};
use crate::validation::{sanitize_code, sanitize_url};
use chrono::{Days, NaiveDate};
use thiserror::Error;

/// Days after registration before the group is due for review
pub const RENEW_ALLOWANCE_DAYS: u64 = 30;
/// Days after registration before the group lapses
pub const REMOVE_ALLOWANCE_DAYS: u64 = 60;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialogState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    #[must_use]
    pub fn new(state: DialogState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Date {0} is too late to compute expiry dates")]
    DateOutOfRange(NaiveDate),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs; all I/O is
/// described by the returned effects.
///
/// # Errors
///
/// `TransitionError::InvalidTransition` for a store outcome outside the url
/// step, and `TransitionError::DateOutOfRange` if the expiry dates overflow.
pub fn transition(
    state: &DialogState,
    context: &DialogContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // State-independent commands
        // ============================================================
        (state, Event::Command(Command::Start)) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::Reply(Reply::Help))
            .with_effect(Effect::EnsureUser)),

        (state, Event::Command(Command::Help)) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::Reply(Reply::Help)))
        }

        (state, Event::Command(Command::About)) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::Reply(Reply::About)))
        }

        (state, Event::Command(Command::ListAll)) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::SendListing))
        }

        // ============================================================
        // Registration dialog
        // ============================================================

        // Any state + add_group -> AwaitingCode (restarts an unfinished dialog)
        (_, Event::Command(Command::AddGroup)) => Ok(TransitionResult::new(DialogState::AwaitingCode)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::Reply(Reply::PromptCode))),

        // Idle + free text -> ignored
        (DialogState::Idle, Event::Text(_)) => Ok(TransitionResult::new(DialogState::Idle)),

        // AwaitingCode + text -> AwaitingUrl if the code is well formed
        (DialogState::AwaitingCode, Event::Text(text)) => match sanitize_code(&text) {
            Ok(code) => Ok(TransitionResult::new(DialogState::AwaitingUrl { code })
                .with_effect(Effect::PersistState)
                .with_effect(Effect::Reply(Reply::PromptUrl))),
            Err(_) => Ok(TransitionResult::new(DialogState::AwaitingCode)
                .with_effect(Effect::Reply(Reply::InvalidCode))),
        },

        // AwaitingUrl + text -> attempt the insert if the link is well formed
        (DialogState::AwaitingUrl { code }, Event::Text(text)) => match sanitize_url(&text) {
            Ok(url) => {
                let registration = build_registration(code, url, context)?;
                Ok(TransitionResult::new(state.clone())
                    .with_effect(Effect::RegisterGroup { registration }))
            }
            Err(_) => Ok(TransitionResult::new(state.clone())
                .with_effect(Effect::Reply(Reply::InvalidUrl))),
        },

        // Insert succeeded -> Idle
        (DialogState::AwaitingUrl { .. }, Event::RegistrationAccepted) => {
            Ok(TransitionResult::new(DialogState::Idle)
                .with_effect(Effect::PersistState)
                .with_effect(Effect::Reply(Reply::Registered)))
        }

        // Course already has a group -> back to asking for a code
        (
            DialogState::AwaitingUrl { .. },
            Event::RegistrationRejected {
                column: KeyColumn::Code,
            },
        ) => Ok(TransitionResult::new(DialogState::AwaitingCode)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::Reply(Reply::CodeTaken))),

        // Link belongs to another course -> keep the code, ask for another link
        (
            DialogState::AwaitingUrl { .. },
            Event::RegistrationRejected {
                column: KeyColumn::Url,
            },
        ) => Ok(TransitionResult::new(state.clone()).with_effect(Effect::Reply(Reply::UrlTaken))),

        // ============================================================
        // Cancellation
        // ============================================================
        (DialogState::Idle, Event::Command(Command::Cancel)) => Ok(TransitionResult::new(
            DialogState::Idle,
        )
        .with_effect(Effect::Reply(Reply::NothingToCancel))),

        (_, Event::Command(Command::Cancel)) => Ok(TransitionResult::new(DialogState::Idle)
            .with_effect(Effect::PersistState)
            .with_effect(Effect::Reply(Reply::Cancelled))),

        // ============================================================
        // Invalid Transitions
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {state:?} with event {event:?}"
        ))),
    }
}

/// Registration record for a finished dialog, dated from `context.today`
fn build_registration(
    code: &str,
    url: String,
    context: &DialogContext,
) -> Result<ModRegistration, TransitionError> {
    let after = |days| {
        context
            .today
            .checked_add_days(Days::new(days))
            .ok_or(TransitionError::DateOutOfRange(context.today))
    };

    Ok(ModRegistration {
        url,
        code: code.to_string(),
        renew_date: after(RENEW_ALLOWANCE_DAYS)?,
        remove_date: after(REMOVE_ALLOWANCE_DAYS)?,
        admin: context.user_id.clone(),
    })
}
