//! Trait abstractions for runtime I/O
//!
//! These traits let the controller run against mock implementations.

use super::OutgoingMessage;
use crate::db::{Database, DbResult, DialogState, ModRegistration, UserRecord};
use crate::telegram::TransportError;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for registrations and per-user dialog state
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Registration for a course code, if any
    async fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>>;

    /// Registrations owned by a user
    async fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>>;

    /// Registrations whose code matches `pattern`; the empty pattern matches all
    async fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>>;

    /// Dialog state of a user, created with defaults if unknown
    async fn get_user(&self, user_id: &str) -> DbResult<UserRecord>;

    /// Record a user if unknown
    async fn add_user(&self, user_id: &str) -> DbResult<()>;

    /// Create or overwrite a user's dialog state
    async fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()>;

    /// Insert a registration, failing on a duplicate code or url
    async fn add_mod(&self, registration: &ModRegistration) -> DbResult<()>;

    /// Insert or overwrite a registration by code
    async fn update_mod(&self, registration: &ModRegistration) -> DbResult<()>;

    /// Remove a registration if present
    async fn delete_mod(&self, code: &str) -> DbResult<()>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: RecordStore + ?Sized> RecordStore for Arc<T> {
    async fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>> {
        (**self).get_mod(code).await
    }

    async fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>> {
        (**self).get_mods_by_admin(user_id).await
    }

    async fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>> {
        (**self).get_mods_matching(pattern).await
    }

    async fn get_user(&self, user_id: &str) -> DbResult<UserRecord> {
        (**self).get_user(user_id).await
    }

    async fn add_user(&self, user_id: &str) -> DbResult<()> {
        (**self).add_user(user_id).await
    }

    async fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()> {
        (**self).update_user(user_id, state, msg_temp).await
    }

    async fn add_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        (**self).add_mod(registration).await
    }

    async fn update_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        (**self).update_mod(registration).await
    }

    async fn delete_mod(&self, code: &str) -> DbResult<()> {
        (**self).delete_mod(code).await
    }
}

#[async_trait]
impl<T: MessageSender + ?Sized> MessageSender for Arc<T> {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        (**self).send(message).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl RecordStore for Database {
    async fn get_mod(&self, code: &str) -> DbResult<Option<ModRegistration>> {
        Database::get_mod(self, code)
    }

    async fn get_mods_by_admin(&self, user_id: &str) -> DbResult<Vec<ModRegistration>> {
        Database::get_mods_by_admin(self, user_id)
    }

    async fn get_mods_matching(&self, pattern: &str) -> DbResult<Vec<ModRegistration>> {
        Database::get_mods_matching(self, pattern)
    }

    async fn get_user(&self, user_id: &str) -> DbResult<UserRecord> {
        Database::get_user(self, user_id)
    }

    async fn add_user(&self, user_id: &str) -> DbResult<()> {
        Database::add_user(self, user_id)
    }

    async fn update_user(
        &self,
        user_id: &str,
        state: &DialogState,
        msg_temp: Option<&str>,
    ) -> DbResult<()> {
        Database::update_user(self, user_id, state, msg_temp)
    }

    async fn add_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        Database::add_mod(self, registration)
    }

    async fn update_mod(&self, registration: &ModRegistration) -> DbResult<()> {
        Database::update_mod(self, registration)
    }

    async fn delete_mod(&self, code: &str) -> DbResult<()> {
        Database::delete_mod(self, code)
    }
}
