//! Dialog state types

use chrono::NaiveDate;

/// Tag persisted for a user waiting to send a course code
pub const TAG_AWAITING_CODE: &str = "add_group@code";
/// Tag persisted for a user waiting to send an invite link
pub const TAG_AWAITING_URL: &str = "add_group@url";

/// Position of a single user in the registration dialog.
///
/// The course code captured in the first step lives inside `AwaitingUrl`,
/// so an idle user can never hold a stray code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    /// No dialog in progress
    #[default]
    Idle,

    /// `add_group` was issued, waiting for a course code
    AwaitingCode,

    /// Course code accepted, waiting for the group invite link
    AwaitingUrl { code: String },
}

impl DialogState {
    /// Split into the `(state, code_temp)` column pair
    #[must_use]
    pub fn to_columns(&self) -> (Option<&'static str>, Option<&str>) {
        match self {
            DialogState::Idle => (None, None),
            DialogState::AwaitingCode => (Some(TAG_AWAITING_CODE), None),
            DialogState::AwaitingUrl { code } => (Some(TAG_AWAITING_URL), Some(code.as_str())),
        }
    }

    /// Rebuild from the `(state, code_temp)` column pair.
    ///
    /// Rows that do not describe a valid position fall back to `Idle`.
    #[must_use]
    pub fn from_columns(state: Option<&str>, code_temp: Option<String>) -> Self {
        match (state, code_temp) {
            (None, _) => DialogState::Idle,
            (Some(TAG_AWAITING_CODE), _) => DialogState::AwaitingCode,
            (Some(TAG_AWAITING_URL), Some(code)) => DialogState::AwaitingUrl { code },
            (Some(tag), code) => {
                tracing::warn!(
                    state = %tag,
                    has_code = code.is_some(),
                    "Unrecognised dialog state, treating as idle"
                );
                DialogState::Idle
            }
        }
    }
}

/// Immutable inputs for one transition
#[derive(Debug, Clone)]
pub struct DialogContext {
    /// Identifier of the user sending the message
    pub user_id: String,
    /// Calendar date used for renew/remove computation
    pub today: NaiveDate,
}

impl DialogContext {
    #[must_use]
    pub fn new(user_id: impl Into<String>, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            today,
        }
    }
}
