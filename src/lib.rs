//! # Bunkerbot - a Telegram bot for the "Bunker" party game
//!
//! Bunkerbot runs the social deduction party game "Bunker" over Telegram.
//! An admin opens a room, players join with a room code and receive a
//! randomly generated character card (biology, profession, health, hobby,
//! two luggage items, a fact and two secret "special condition" cards),
//! and the admin can reveal, reshuffle, swap or manually edit attributes
//! while the round is played out in chat.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bunkerbot::config::Config;
//! use bunkerbot::bot::BotServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Load configuration
//!     let config = Config::load("config.toml").await?;
//!
//!     // Create and start the bot
//!     let server = BotServer::new(config).await?;
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bot`] - Telegram dispatcher, command handlers and dialog flows
//! - [`game`] - Game rules: categories, character allocation, room operations
//! - [`storage`] - Relational persistence for rooms, players, pools and dialogs
//! - [`sheets`] - Attribute pool import from a Google spreadsheet
//! - [`config`] - Configuration management and validation
//!
//! ## Architecture
//!
//! The crate keeps three layers with clear seams:
//!
//! ```text
//! ┌─────────────────┐
//! │   Bot Layer     │ ← Telegram updates, dialogs, message rendering
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Game Rules    │ ← Allocation, lifecycle and mutation operations
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Storage       │ ← SQLite via sqlx, one transaction per operation
//! └─────────────────┘
//! ```
//!
//! The game layer never talks to Telegram: every operation returns typed
//! outcomes (old and new values, affected players) and the bot layer turns
//! those into chat replies and per-player notifications. That split keeps
//! the whole rule set testable without a network in sight.

pub mod bot;
pub mod config;
pub mod game;
pub mod logutil;
pub mod sheets;
pub mod storage;
