//! Listing of registered groups, split to fit the transport's message size

use crate::db::ModRegistration;

/// Maximum characters per listing message.
///
/// Telegram caps messages at 4096 characters; the rest is headroom.
pub const MSG_CHAR_LIMIT: usize = 4000;

/// One listing line: the course code linking to its group
#[must_use]
pub fn format_entry(registration: &ModRegistration) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        registration.url, registration.code
    )
}

/// Greedily pack newline-joined entries into chunks of at most `limit` characters.
///
/// Entries are never split; one longer than `limit` is sent on its own.
#[must_use]
pub fn chunk_entries<I, S>(entries: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for entry in entries {
        let entry = entry.as_ref();
        let entry_len = entry.chars().count();

        if current_len > 0 && current_len + 1 + entry_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if current_len > 0 {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(entry);
        current_len += entry_len;
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}

/// Listing messages for all registrations; empty when there are none
#[must_use]
pub fn build_listing(registrations: &[ModRegistration]) -> Vec<String> {
    chunk_entries(registrations.iter().map(format_entry), MSG_CHAR_LIMIT)
}
