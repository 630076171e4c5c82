//! Conversation controller executor

use super::traits::{MessageSender, RecordStore};
use super::{IncomingMessage, MessageKind, OutgoingMessage};
use crate::db::{DbError, ModRegistration};
use crate::listing::build_listing;
use crate::state_machine::{
    transition, Command, DialogContext, DialogState, Effect, Event, Reply, TransitionError,
};
use crate::telegram::TransportError;
use crate::templates::render;
use chrono::{Local, NaiveDate};
use std::collections::VecDeque;
use thiserror::Error;

/// Failure while handling one message; the user gets no further reply
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Store error: {0}")]
    Store(#[from] DbError),
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Controller that can work with any store and transport implementation
pub struct BotRuntime<S, M>
where
    S: RecordStore,
    M: MessageSender,
{
    store: S,
    sender: M,
}

impl<S, M> BotRuntime<S, M>
where
    S: RecordStore,
    M: MessageSender,
{
    #[must_use]
    pub fn new(store: S, sender: M) -> Self {
        Self { store, sender }
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handle one message, dating any registration with the local calendar date
    ///
    /// # Errors
    ///
    /// See [`BotRuntime::handle_at`].
    pub async fn handle(&self, message: IncomingMessage) -> Result<(), RuntimeError> {
        self.handle_at(message, Local::now().date_naive()).await
    }

    /// Handle one message as if it arrived on `today`
    ///
    /// # Errors
    ///
    /// Stops at the first store, transition or transport failure. Effects that
    /// already ran are not rolled back.
    pub async fn handle_at(
        &self,
        message: IncomingMessage,
        today: NaiveDate,
    ) -> Result<(), RuntimeError> {
        let event = match message.kind {
            MessageKind::Command(name) => {
                let Some(command) = Command::parse(&name) else {
                    tracing::debug!(command = %name, user_id = %message.user_id, "Ignoring unknown command");
                    return Ok(());
                };
                Event::Command(command)
            }
            MessageKind::Text(text) => Event::Text(text),
        };

        let user = self.store.get_user(&message.user_id).await?;
        let context = DialogContext::new(message.user_id, today);
        let mut state = user.state;
        let mut pending = VecDeque::from([event]);

        while let Some(event) = pending.pop_front() {
            tracing::debug!(user_id = %context.user_id, state = ?state, event = ?event, "Dialog event");
            let result = transition(&state, &context, event)?;

            if result.new_state != state {
                tracing::info!(
                    user_id = %context.user_id,
                    from = ?state,
                    to = ?result.new_state,
                    "Dialog state changed"
                );
            }
            state = result.new_state;

            for effect in result.effects {
                if let Some(next) = self
                    .execute_effect(effect, &state, &context, message.chat_id)
                    .await?
                {
                    pending.push_back(next);
                }
            }
        }

        Ok(())
    }

    /// Run one effect, returning the event it produced, if any
    async fn execute_effect(
        &self,
        effect: Effect,
        state: &DialogState,
        context: &DialogContext,
        chat_id: i64,
    ) -> Result<Option<Event>, RuntimeError> {
        match effect {
            Effect::PersistState => {
                self.store.update_user(&context.user_id, state, None).await?;
                Ok(None)
            }
            Effect::EnsureUser => {
                self.store.add_user(&context.user_id).await?;
                Ok(None)
            }
            Effect::Reply(reply) => {
                self.reply(chat_id, reply).await?;
                Ok(None)
            }
            Effect::SendListing => {
                self.send_listing(chat_id).await?;
                Ok(None)
            }
            Effect::RegisterGroup { registration } => {
                self.register(&registration).await.map(Some)
            }
        }
    }

    async fn register(&self, registration: &ModRegistration) -> Result<Event, RuntimeError> {
        match self.store.add_mod(registration).await {
            Ok(()) => Ok(Event::RegistrationAccepted),
            Err(DbError::DuplicateKey(column)) => {
                tracing::info!(
                    code = %registration.code,
                    user_id = %registration.admin,
                    column = %column,
                    "Registration rejected"
                );
                Ok(Event::RegistrationRejected { column })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn reply(&self, chat_id: i64, reply: Reply) -> Result<(), RuntimeError> {
        let message = OutgoingMessage::from_template(chat_id, render(reply));
        self.sender.send(&message).await?;
        Ok(())
    }

    async fn send_listing(&self, chat_id: i64) -> Result<(), RuntimeError> {
        let registrations = self.store.get_mods_matching("").await?;
        let chunks = build_listing(&registrations);

        if chunks.is_empty() {
            return self.reply(chat_id, Reply::ListEmpty).await;
        }

        tracing::debug!(
            groups = registrations.len(),
            messages = chunks.len(),
            "Sending listing"
        );
        for chunk in chunks {
            self.sender
                .send(&OutgoingMessage::listing(chat_id, chunk))
                .await?;
        }
        Ok(())
    }
}
