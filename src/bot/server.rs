//! Dispatcher wiring, startup sequence and notification delivery.

use anyhow::Result;
use log::{info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::sync::{Mutex, RwLock};

use super::commands::{self, Command};
use super::{BotState, Notice};
use crate::config::Config;
use crate::game::{Allocator, AttributePool};
use crate::sheets::SheetClient;
use crate::storage::Storage;

/// The running bot: a Telegram connection plus all shared game state.
pub struct BotServer {
    bot: Bot,
    state: Arc<BotState>,
}

impl BotServer {
    /// Connect the store, import the attribute pool and build the shared
    /// state. The sheet being unreachable at startup is not fatal: the
    /// previously persisted pool is used until a successful `/reload`.
    pub async fn new(config: Config) -> Result<Self> {
        let storage = Storage::connect(&config.storage.database_url).await?;
        storage.migrate().await?;
        info!("Storage ready at {}", config.storage.database_url);

        let sheets = SheetClient::new(config.sheet.clone());
        let pool = match sheets.fetch_columns().await {
            Ok(columns) => {
                let pool = AttributePool::from_columns(columns);
                if pool.is_empty() {
                    warn!("Sheet import yielded no usable columns; falling back to persisted pool");
                    storage.load_pool().await?
                } else {
                    storage.replace_pool(&pool.entries()).await?;
                    info!("Attribute pool imported from sheet");
                    pool
                }
            }
            Err(e) => {
                warn!("Sheet import failed at startup: {}; using persisted pool", e);
                storage.load_pool().await?
            }
        };
        if pool.is_empty() {
            warn!("Attribute pool is empty; joins will fail until /reload succeeds");
        }

        let bot = Bot::new(config.telegram.token.clone());
        let state = Arc::new(BotState {
            storage,
            pool: RwLock::new(pool),
            allocator: Mutex::new(Allocator::new()),
            sheets,
            admin_id: config.telegram.admin_id,
            room_code_length: config.game.room_code_length,
        });

        Ok(BotServer { bot, state })
    }

    /// Run long polling until interrupted.
    pub async fn run(self) -> Result<()> {
        info!("Bot dispatcher starting");

        let handler = Update::filter_message()
            .branch(
                dptree::entry()
                    .filter_command::<Command>()
                    .endpoint(commands::handle_command),
            )
            .branch(dptree::endpoint(commands::handle_dialog_message));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.state])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Bot dispatcher stopped");
        Ok(())
    }
}

/// Deliver post-commit notices. A player who blocked the bot (or any
/// other delivery failure) is logged and skipped; the data mutation that
/// produced the notice already committed and stays committed.
pub async fn deliver_notices(bot: &Bot, notices: &[Notice]) {
    for notice in notices {
        if let Err(e) = bot.send_message(ChatId(notice.user_id), notice.text.clone()).await {
            warn!("Failed to notify user {}: {}", notice.user_id, e);
        }
    }
}
