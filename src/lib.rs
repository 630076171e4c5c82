//! Course group directory bot
//!
//! Students register the chat groups of their courses through a two-step
//! dialog and browse every registered group.

pub mod config;
pub mod db;
pub mod listing;
pub mod runtime;
pub mod state_machine;
pub mod telegram;
pub mod templates;
pub mod validation;
