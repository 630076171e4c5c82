//! Mock implementations for testing
//!
//! These mocks enable controller testing without real I/O.

use super::traits::*;
use super::OutgoingMessage;
use crate::db::{DbError, DbResult, DialogState, KeyColumn, ModRegistration, UserRecord};
use crate::telegram::TransportError;
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// In-memory Record Store
// ============================================================================

/// Record store backed by plain collections, with the same key rules as the database
#[derive(Default)]
pub struct InMemoryStore {
    mods: Mutex<Vec<ModRegistration>>,
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Current state without the create-on-read side effect
    pub fn peek_state(&self, user_id: &str) -> Option<DialogState> {
        self.users
            .lock()
            .unwrap()
            .get(user_id)
            .map(|u| u.state.clone())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>> {
        Ok(self.mods.lock().unwrap().iter().find(|m| m.code == code).cloned())
    }

    async fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>> {
        Ok(self
            .mods
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.admin == user_id)
            .cloned()
            .collect())
    }

    async fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>> {
        let filter = Regex::new(pattern)?;
        Ok(self
            .mods
            .lock()
            .unwrap()
            .iter()
            .filter(|m| filter.is_match(&m.code))
            .cloned()
            .collect())
    }

    async fn get_user(&self, user_id: &str) -> DbResult<UserRecord> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id))
            .clone())
    }

    async fn add_user(&self, user_id: &str) -> DbResult<()> {
        self.users
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_insert_with(|| UserRecord::new(user_id));
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()> {
        self.users.lock().unwrap().insert(
            user_id.to_string(),
            UserRecord {
                id: user_id.to_string(),
                state: state.clone(),
                msg_temp: msg_temp.map(String::from),
            },
        );
        Ok(())
    }

    async fn add_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        let mut mods = self.mods.lock().unwrap();
        if mods.iter().any(|m| m.code == registration.code) {
            return Err(DbError::DuplicateKey(KeyColumn::Code));
        }
        if mods.iter().any(|m| m.url == registration.url) {
            return Err(DbError::DuplicateKey(KeyColumn::Url));
        }
        mods.push(registration.clone());
        Ok(())
    }

    async fn update_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        let mut mods = self.mods.lock().unwrap();
        if mods
            .iter()
            .any(|m| m.url == registration.url && m.code != registration.code)
        {
            return Err(DbError::DuplicateKey(KeyColumn::Url));
        }
        match mods.iter_mut().find(|m| m.code == registration.code) {
            Some(existing) => *existing = registration.clone(),
            None => mods.push(registration.clone()),
        }
        Ok(())
    }

    async fn delete_mod(&self, code: &str) -> DbResult<()> {
        self.mods.lock().unwrap().retain(|m| m.code != code);
        Ok(())
    }
}

// ============================================================================
// Failing Record Store
// ============================================================================

/// Wraps a store and fails every `add_mod` with a backend fault
pub struct BrokenInsertStore {
    pub inner: InMemoryStore,
}

#[async_trait]
impl RecordStore for BrokenInsertStore {
    async fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>> {
        self.inner.get_mod(code).await
    }

    async fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>> {
        self.inner.get_mods_by_admin(user_id).await
    }

    async fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>> {
        self.inner.get_mods_matching(pattern).await
    }

    async fn get_user(&self, user_id: &str) -> DbResult<UserRecord> {
        self.inner.get_user(user_id).await
    }

    async fn add_user(&self, user_id: &str) -> DbResult<()> {
        self.inner.add_user(user_id).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()> {
        self.inner.update_user(user_id, state, msg_temp).await
    }

    async fn add_mod(&self, _registration: &ModRegistration) -> DbResult<()> {
        Err(DbError::LockPoisoned)
    }

    async fn update_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        self.inner.update_mod(registration).await
    }

    async fn delete_mod(&self, code: &str) -> DbResult<()> {
        self.inner.delete_mod(code).await
    }
}

// ============================================================================
// Recording Sender
// ============================================================================

/// Sender that keeps every message instead of delivering it
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<OutgoingMessage>>,
    /// Wait this long before recording each message
    delay: Duration,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    /// Texts sent so far, oldest first
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.text.clone())
            .collect()
    }

    /// Forget everything sent so far
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl MessageSender for RecordingSender {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::listing::MSG_CHAR_LIMIT;
    use crate::runtime::{BotRuntime, IncomingMessage, RuntimeError};
    use crate::state_machine::Reply;
    use crate::templates::render;
    use chrono::NaiveDate;
    use std::sync::Arc;

    const CHAT: i64 = 1001;
    const USER: &str = "42";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn text_of(reply: Reply) -> String {
        render(reply).text.to_string()
    }

    type TestRuntime = BotRuntime<Arc<InMemoryStore>, Arc<RecordingSender>>;

    fn runtime() -> (TestRuntime, Arc<InMemoryStore>, Arc<RecordingSender>) {
        let store = Arc::new(InMemoryStore::new());
        let sender = Arc::new(RecordingSender::new());
        (
            BotRuntime::new(store.clone(), sender.clone()),
            store,
            sender,
        )
    }

    async fn command<S: RecordStore, M: MessageSender>(rt: &BotRuntime<S, M>, user: &str, name: &str) {
        rt.handle_at(IncomingMessage::command(CHAT, user, name), today())
            .await
            .unwrap();
    }

    async fn say<S: RecordStore, M: MessageSender>(rt: &BotRuntime<S, M>, user: &str, text: &str) {
        rt.handle_at(IncomingMessage::text(CHAT, user, text), today())
            .await
            .unwrap();
    }

    async fn register<S: RecordStore, M: MessageSender>(
        rt: &BotRuntime<S, M>,
        user: &str,
        code: &str,
        url: &str,
    ) {
        command(rt, user, "add_group").await;
        say(rt, user, code).await;
        say(rt, user, url).await;
    }

    #[tokio::test]
    async fn test_full_registration_flow() {
        let (rt, store, sender) = runtime();

        command(&rt, USER, "add_group").await;
        assert_eq!(store.peek_state(USER), Some(DialogState::AwaitingCode));

        say(&rt, USER, "cs2103t").await;
        assert_eq!(
            store.peek_state(USER),
            Some(DialogState::AwaitingUrl {
                code: "CS2103T".to_string()
            })
        );

        say(&rt, USER, "https://t.me/joinchat/xyz").await;
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));

        let registration = store.get_mod("CS2103T").await.unwrap().unwrap();
        assert_eq!(registration.url, "https://t.me/joinchat/xyz");
        assert_eq!(registration.admin, USER);
        assert_eq!(registration.renew_date, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(registration.remove_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        assert_eq!(
            sender.texts(),
            vec![
                text_of(Reply::PromptCode),
                text_of(Reply::PromptUrl),
                text_of(Reply::Registered),
            ]
        );
        assert!(sender.sent.lock().unwrap().iter().all(|m| m.chat_id == CHAT));
    }

    #[tokio::test]
    async fn test_full_registration_flow_against_database() {
        let db = Database::open_in_memory().unwrap();
        let sender = Arc::new(RecordingSender::new());
        let rt = BotRuntime::new(db.clone(), sender.clone());

        register(&rt, USER, " cs2103t ", "https://t.me/joinchat/xyz").await;

        let registration = db.get_mod("CS2103T").unwrap().unwrap();
        assert_eq!(registration.admin, USER);
        assert_eq!(db.get_user(USER).unwrap().state, DialogState::Idle);
        assert_eq!(sender.texts().last(), Some(&text_of(Reply::Registered)));
    }

    #[tokio::test]
    async fn test_invalid_code_keeps_asking() {
        let (rt, store, sender) = runtime();
        command(&rt, USER, "add_group").await;
        sender.clear();

        say(&rt, USER, "C123").await;
        assert_eq!(store.peek_state(USER), Some(DialogState::AwaitingCode));
        assert_eq!(sender.texts(), vec![text_of(Reply::InvalidCode)]);
    }

    #[tokio::test]
    async fn test_invalid_url_keeps_code() {
        let (rt, store, sender) = runtime();
        command(&rt, USER, "add_group").await;
        say(&rt, USER, "CS2103T").await;
        sender.clear();

        say(&rt, USER, "https://t.me/joinchat/xyz/extra").await;
        assert_eq!(
            store.peek_state(USER),
            Some(DialogState::AwaitingUrl {
                code: "CS2103T".to_string()
            })
        );
        assert_eq!(sender.texts(), vec![text_of(Reply::InvalidUrl)]);
        assert!(store.get_mod("CS2103T").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_restarts_code_step() {
        let (rt, store, sender) = runtime();
        register(&rt, "1", "CS2103T", "https://t.me/joinchat/first").await;

        command(&rt, USER, "add_group").await;
        say(&rt, USER, "CS2103T").await;
        sender.clear();
        say(&rt, USER, "https://t.me/joinchat/second").await;

        assert_eq!(sender.texts(), vec![text_of(Reply::CodeTaken)]);
        assert_eq!(store.peek_state(USER), Some(DialogState::AwaitingCode));
        let kept = store.get_mod("CS2103T").await.unwrap().unwrap();
        assert_eq!(kept.url, "https://t.me/joinchat/first");
    }

    #[tokio::test]
    async fn test_duplicate_url_keeps_url_step() {
        let (rt, store, sender) = runtime();
        register(&rt, "1", "CS1010", "https://t.me/joinchat/shared").await;

        command(&rt, USER, "add_group").await;
        say(&rt, USER, "MA1521").await;
        sender.clear();
        say(&rt, USER, "https://t.me/joinchat/shared").await;

        assert_eq!(sender.texts(), vec![text_of(Reply::UrlTaken)]);
        assert_eq!(
            store.peek_state(USER),
            Some(DialogState::AwaitingUrl {
                code: "MA1521".to_string()
            })
        );

        // A different link then completes the registration
        say(&rt, USER, "https://t.me/joinchat/other").await;
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));
        assert!(store.get_mod("MA1521").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_when_idle() {
        let (rt, store, sender) = runtime();

        command(&rt, USER, "cancel").await;

        assert_eq!(sender.texts(), vec![text_of(Reply::NothingToCancel)]);
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));
    }

    #[tokio::test]
    async fn test_cancel_mid_dialog() {
        let (rt, store, sender) = runtime();
        command(&rt, USER, "add_group").await;
        say(&rt, USER, "CS2103T").await;
        sender.clear();

        command(&rt, USER, "cancel").await;

        assert_eq!(sender.texts(), vec![text_of(Reply::Cancelled)]);
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));
        assert!(store.get_mod("CS2103T").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_shows_help_and_records_user_once() {
        let (rt, store, sender) = runtime();

        command(&rt, USER, "start").await;
        command(&rt, USER, "start").await;

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));
        assert_eq!(
            sender.texts(),
            vec![text_of(Reply::Help), text_of(Reply::Help)]
        );
    }

    #[tokio::test]
    async fn test_help_and_about() {
        let (rt, _store, sender) = runtime();

        command(&rt, USER, "help").await;
        command(&rt, USER, "about").await;

        assert_eq!(
            sender.texts(),
            vec![text_of(Reply::Help), text_of(Reply::About)]
        );
        assert!(sender.sent.lock().unwrap().iter().all(|m| m.html));
    }

    #[tokio::test]
    async fn test_list_all_empty() {
        let (rt, _store, sender) = runtime();
        command(&rt, USER, "list_all").await;
        assert_eq!(sender.texts(), vec![text_of(Reply::ListEmpty)]);
    }

    #[tokio::test]
    async fn test_list_all_single_chunk() {
        let (rt, _store, sender) = runtime();
        register(&rt, USER, "CS1010", "https://t.me/joinchat/a").await;
        register(&rt, USER, "MA1521", "https://t.me/joinchat/b").await;
        sender.clear();

        command(&rt, USER, "list_all").await;

        let sent = sender.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].html);
        assert!(sent[0].text.contains(">CS1010</a>"));
        assert!(sent[0].text.contains(">MA1521</a>"));
    }

    #[tokio::test]
    async fn test_list_all_splits_large_listing() {
        let (rt, store, sender) = runtime();
        let date = today();
        // Each entry is 100 characters: 79-char url, 6-char code, 15 of markup
        for i in 0..40 {
            store
                .add_mod(&ModRegistration {
                    url: format!("https://t.me/joinchat/{i:0>57}"),
                    code: format!("CS{i:04}"),
                    renew_date: date,
                    remove_date: date,
                    admin: USER.to_string(),
                })
                .await
                .unwrap();
        }

        command(&rt, USER, "list_all").await;

        let texts = sender.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts.iter().all(|t| t.chars().count() <= MSG_CHAR_LIMIT));
        let lines: usize = texts.iter().map(|t| t.lines().count()).sum();
        assert_eq!(lines, 40);
    }

    #[tokio::test]
    async fn test_list_all_does_not_disturb_dialog() {
        let (rt, store, _sender) = runtime();
        command(&rt, USER, "add_group").await;
        say(&rt, USER, "CS2103T").await;

        command(&rt, USER, "list_all").await;

        assert_eq!(
            store.peek_state(USER),
            Some(DialogState::AwaitingUrl {
                code: "CS2103T".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_idle_text_gets_no_reply() {
        let (rt, store, sender) = runtime();
        say(&rt, USER, "hello there").await;

        assert!(sender.texts().is_empty());
        assert_eq!(store.peek_state(USER), Some(DialogState::Idle));
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let (rt, store, sender) = runtime();
        command(&rt, USER, "delete_everything").await;
        command(&rt, USER, "Help").await;

        assert!(sender.texts().is_empty());
        assert_eq!(store.user_count(), 0);
    }

    #[tokio::test]
    async fn test_users_have_independent_dialogs() {
        let (rt, store, _sender) = runtime();
        command(&rt, "1", "add_group").await;
        command(&rt, "2", "add_group").await;
        say(&rt, "1", "CS1010").await;

        assert_eq!(
            store.peek_state("1"),
            Some(DialogState::AwaitingUrl {
                code: "CS1010".to_string()
            })
        );
        assert_eq!(store.peek_state("2"), Some(DialogState::AwaitingCode));
    }

    #[tokio::test]
    async fn test_store_fault_fails_only_that_message() {
        let store = Arc::new(BrokenInsertStore {
            inner: InMemoryStore::new(),
        });
        let sender = Arc::new(RecordingSender::new());
        let rt = BotRuntime::new(store.clone(), sender.clone());

        command(&rt, USER, "add_group").await;
        say(&rt, USER, "CS2103T").await;
        sender.clear();

        let result = rt
            .handle_at(
                IncomingMessage::text(CHAT, USER, "https://t.me/joinchat/xyz"),
                today(),
            )
            .await;

        assert!(matches!(result, Err(RuntimeError::Store(DbError::LockPoisoned))));
        assert!(sender.texts().is_empty());
        assert_eq!(
            store.inner.peek_state(USER),
            Some(DialogState::AwaitingUrl {
                code: "CS2103T".to_string()
            })
        );

        // Other users are unaffected
        command(&rt, "7", "add_group").await;
        assert_eq!(store.inner.peek_state("7"), Some(DialogState::AwaitingCode));
    }

    #[tokio::test]
    async fn test_in_memory_store_matches_database_key_rules() {
        let store = InMemoryStore::new();
        let date = today();
        let reg = |code: &str, url: &str| ModRegistration {
            url: url.to_string(),
            code: code.to_string(),
            renew_date: date,
            remove_date: date,
            admin: USER.to_string(),
        };

        store.add_mod(&reg("CS1010", "https://t.me/joinchat/a")).await.unwrap();
        assert!(matches!(
            store.add_mod(&reg("CS1010", "https://t.me/joinchat/a")).await,
            Err(DbError::DuplicateKey(KeyColumn::Code))
        ));
        assert!(matches!(
            store.add_mod(&reg("CS2040", "https://t.me/joinchat/a")).await,
            Err(DbError::DuplicateKey(KeyColumn::Url))
        ));

        store.update_mod(&reg("CS1010", "https://t.me/joinchat/b")).await.unwrap();
        assert_eq!(
            store.get_mod("CS1010").await.unwrap().unwrap().url,
            "https://t.me/joinchat/b"
        );
        assert_eq!(store.get_mods_by_admin(USER).await.unwrap().len(), 1);

        store.delete_mod("CS1010").await.unwrap();
        assert!(store.get_mods_matching("").await.unwrap().is_empty());
    }
}
