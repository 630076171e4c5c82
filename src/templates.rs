//! User-facing texts

use crate::state_machine::Reply;

pub const HELP_TEXT: &str = "\
<b>Course group directory</b>

Find and share the chat groups of your courses.

/list_all - list every registered course group
/add_group - register the group of a course
/cancel - stop what you are doing
/help - show this message
/about - about this bot";

pub const ABOUT_TEXT: &str = "\
This bot keeps a directory of course discussion groups run by students.

Registrations are reviewed 30 days after they are made and lapse after 60.";

/// Rendered reply, ready for the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub text: &'static str,
    /// Send with HTML parse mode
    pub html: bool,
    /// Suppress link previews
    pub disable_preview: bool,
}

impl Template {
    const fn plain(text: &'static str) -> Self {
        Self {
            text,
            html: false,
            disable_preview: false,
        }
    }

    const fn rich(text: &'static str) -> Self {
        Self {
            text,
            html: true,
            disable_preview: true,
        }
    }
}

#[must_use]
pub fn render(reply: Reply) -> Template {
    match reply {
        Reply::Help => Template::rich(HELP_TEXT),
        Reply::About => Template::rich(ABOUT_TEXT),
        Reply::PromptCode => Template::rich(
            "Send me the <b>course code</b> of the group, e.g. <code>CS2103T</code>.\nSend /cancel to stop.",
        ),
        Reply::PromptUrl => Template::rich(
            "Now send me the <b>invite link</b> of the group, e.g. <code>https://t.me/joinchat/AbC123</code>.",
        ),
        Reply::InvalidCode => Template::plain(
            "That does not look like a course code. It should look like CS2103T. Try again, or /cancel.",
        ),
        Reply::InvalidUrl => Template::plain(
            "That does not look like a group invite link. It should start with https://t.me/joinchat/. Try again, or /cancel.",
        ),
        Reply::Registered => Template::plain("Your group has been registered. Thank you!"),
        Reply::CodeTaken => Template::plain(
            "That course already has a registered group. Send another course code, or /cancel.",
        ),
        Reply::UrlTaken => Template::plain(
            "That invite link is already registered for another course. Send another link, or /cancel.",
        ),
        Reply::NothingToCancel => Template::plain("There is nothing to cancel."),
        Reply::Cancelled => Template::plain("Cancelled."),
        Reply::ListEmpty => Template::plain("No groups have been registered yet."),
    }
}
