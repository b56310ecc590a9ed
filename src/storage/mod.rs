//! # Storage Module - Data Persistence Layer
//!
//! Relational persistence for the whole game: rooms, players, the imported
//! attribute pool and in-flight dialog state all live in one SQLite
//! database reached through an sqlx connection pool.
//!
//! ## Schema
//!
//! - `rooms` - one row per room; at most one row has `is_active = 1`
//! - `players` - one row per room membership, keyed `(user_id, room_code)`;
//!   card values are plain columns, the revealed set is a JSON array
//! - `pool_entries` - the persisted copy of the attribute pool, replaced
//!   wholesale on each successful sheet import
//! - `dialogs` - serialized per-user dialog state, keyed by user id
//!
//! ## Transactions
//!
//! Multi-row mutations (joining a room, closing a room, swaps, shuffles,
//! pool replacement) run inside a single transaction so an error partway
//! leaves no partial write. Single-statement updates are atomic as-is.
//!
//! Room-wide value uniqueness is enforced at allocation time by the game
//! layer, not by database constraints; the admin's manual override is
//! allowed to create duplicates.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

use crate::game::Category;

/// A game room. At most one room is active at any time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Room {
    pub code: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// One player's membership and character card within a room.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Player {
    pub user_id: i64,
    pub room_code: String,
    pub username: Option<String>,
    pub name: String,
    pub biology: String,
    pub profession: String,
    pub health: String,
    pub hobby: String,
    pub luggage1: String,
    pub luggage2: String,
    pub fact: String,
    pub special1: String,
    pub special2: String,
    pub used_special1: bool,
    pub used_special2: bool,
    pub revealed: Json<Vec<Category>>,
}

impl Player {
    /// Current value(s) for a category, multi-slot categories first to last.
    pub fn values(&self, category: Category) -> Vec<String> {
        match category {
            Category::Biology => vec![self.biology.clone()],
            Category::Profession => vec![self.profession.clone()],
            Category::Health => vec![self.health.clone()],
            Category::Hobby => vec![self.hobby.clone()],
            Category::Luggage => vec![self.luggage1.clone(), self.luggage2.clone()],
            Category::Fact => vec![self.fact.clone()],
            Category::Special => vec![self.special1.clone(), self.special2.clone()],
        }
    }

    pub fn is_revealed(&self, category: Category) -> bool {
        self.revealed.0.contains(&category)
    }
}

/// Column names backing each category.
fn category_columns(category: Category) -> &'static [&'static str] {
    match category {
        Category::Biology => &["biology"],
        Category::Profession => &["profession"],
        Category::Health => &["health"],
        Category::Hobby => &["hobby"],
        Category::Luggage => &["luggage1", "luggage2"],
        Category::Fact => &["fact"],
        Category::Special => &["special1", "special2"],
    }
}

/// The persistence layer: an sqlx pool plus the queries the game needs.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Open (and create if missing) the database at `url`, e.g.
    /// `sqlite://bunker.db`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Storage { pool })
    }

    /// An isolated in-memory database; used by tests.
    ///
    /// A single connection is mandatory: every `:memory:` connection is
    /// its own database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        let storage = Storage { pool };
        storage.migrate().await?;
        Ok(storage)
    }

    /// Create the schema if it does not exist yet. Idempotent.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                code TEXT PRIMARY KEY,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS players (
                user_id INTEGER NOT NULL,
                room_code TEXT NOT NULL REFERENCES rooms(code),
                username TEXT,
                name TEXT NOT NULL,
                biology TEXT NOT NULL,
                profession TEXT NOT NULL,
                health TEXT NOT NULL,
                hobby TEXT NOT NULL,
                luggage1 TEXT NOT NULL,
                luggage2 TEXT NOT NULL,
                fact TEXT NOT NULL,
                special1 TEXT NOT NULL,
                special2 TEXT NOT NULL,
                used_special1 BOOLEAN NOT NULL DEFAULT FALSE,
                used_special2 BOOLEAN NOT NULL DEFAULT FALSE,
                revealed TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (user_id, room_code)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pool_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT NOT NULL,
                value TEXT NOT NULL,
                UNIQUE(category, value)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS dialogs (
                user_id INTEGER PRIMARY KEY,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Rooms
    // ------------------------------------------------------------------

    /// The currently active room, if any.
    pub async fn active_room(&self) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE is_active = TRUE")
            .fetch_optional(&self.pool)
            .await
    }

    /// An active room by code.
    pub async fn room_active(&self, code: &str) -> Result<Option<Room>, sqlx::Error> {
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE code = ? AND is_active = TRUE")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }

    /// Whether any room, active or closed, ever used this code.
    pub async fn room_exists(&self, code: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM rooms WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn create_room(&self, code: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO rooms (code, is_active, created_at) VALUES (?, TRUE, ?)")
            .bind(code)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Deactivate a room and cascade-delete its players. Returns the
    /// number of deleted player rows.
    pub async fn close_room(&self, code: &str) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE rooms SET is_active = FALSE WHERE code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM players WHERE room_code = ?")
            .bind(code)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;
        Ok(deleted)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    /// Room roster in join order. Shuffle redistribution relies on this
    /// order being stable.
    pub async fn players(&self, room_code: &str) -> Result<Vec<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE room_code = ? ORDER BY rowid")
            .bind(room_code)
            .fetch_all(&self.pool)
            .await
    }

    pub async fn member(&self, room_code: &str, user_id: i64) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE room_code = ? AND user_id = ?")
            .bind(room_code)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// A user's current membership, wherever it is.
    pub async fn player_by_user(&self, user_id: i64) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn player_by_name(
        &self,
        room_code: &str,
        name: &str,
    ) -> Result<Option<Player>, sqlx::Error> {
        sqlx::query_as::<_, Player>("SELECT * FROM players WHERE room_code = ? AND name = ?")
            .bind(room_code)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
    }

    /// Insert a freshly allocated player, atomically replacing any
    /// membership the same user held elsewhere.
    pub async fn adopt_player(&self, player: &Player) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM players WHERE user_id = ?")
            .bind(player.user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            INSERT INTO players
                (user_id, room_code, username, name, biology, profession, health, hobby,
                 luggage1, luggage2, fact, special1, special2,
                 used_special1, used_special2, revealed)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(player.user_id)
        .bind(&player.room_code)
        .bind(&player.username)
        .bind(&player.name)
        .bind(&player.biology)
        .bind(&player.profession)
        .bind(&player.health)
        .bind(&player.hobby)
        .bind(&player.luggage1)
        .bind(&player.luggage2)
        .bind(&player.fact)
        .bind(&player.special1)
        .bind(&player.special2)
        .bind(player.used_special1)
        .bind(player.used_special2)
        .bind(&player.revealed)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Overwrite one player's value(s) for a category.
    pub async fn update_category_values(
        &self,
        room_code: &str,
        user_id: i64,
        category: Category,
        values: &[String],
    ) -> Result<(), sqlx::Error> {
        let columns = category_columns(category);
        debug_assert_eq!(columns.len(), values.len());
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE players SET {} WHERE room_code = ? AND user_id = ?",
            assignments
        );
        let mut query = sqlx::query(&sql);
        for value in values {
            query = query.bind(value);
        }
        query
            .bind(room_code)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Overwrite a category for several players in one transaction; used
    /// by swap and shuffle so a failure never leaves half a permutation.
    pub async fn set_category_values_many(
        &self,
        room_code: &str,
        category: Category,
        updates: &[(i64, Vec<String>)],
    ) -> Result<(), sqlx::Error> {
        let columns = category_columns(category);
        let assignments = columns
            .iter()
            .map(|c| format!("{} = ?", c))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE players SET {} WHERE room_code = ? AND user_id = ?",
            assignments
        );

        let mut tx = self.pool.begin().await?;
        for (user_id, values) in updates {
            debug_assert_eq!(columns.len(), values.len());
            let mut query = sqlx::query(&sql);
            for value in values {
                query = query.bind(value);
            }
            query
                .bind(room_code)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Append a category to a player's revealed set. Returns `false` when
    /// it was already revealed (idempotent add).
    pub async fn add_revealed(
        &self,
        room_code: &str,
        user_id: i64,
        category: Category,
    ) -> Result<bool, sqlx::Error> {
        let player = match self.member(room_code, user_id).await? {
            Some(p) => p,
            None => return Ok(false),
        };
        if player.is_revealed(category) {
            return Ok(false);
        }
        let mut revealed = player.revealed.0;
        revealed.push(category);
        sqlx::query("UPDATE players SET revealed = ? WHERE room_code = ? AND user_id = ?")
            .bind(Json(revealed))
            .bind(room_code)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(true)
    }

    /// Flip `used_specialN` false→true. Returns `false` when the card was
    /// already used; the flag is never reset outside room teardown.
    pub async fn mark_special_used(
        &self,
        room_code: &str,
        user_id: i64,
        slot: u8,
    ) -> Result<bool, sqlx::Error> {
        let column = match slot {
            1 => "used_special1",
            2 => "used_special2",
            _ => return Ok(false),
        };
        let sql = format!(
            "UPDATE players SET {col} = TRUE WHERE room_code = ? AND user_id = ? AND {col} = FALSE",
            col = column
        );
        let affected = sqlx::query(&sql)
            .bind(room_code)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected == 1)
    }

    // ------------------------------------------------------------------
    // Attribute pool
    // ------------------------------------------------------------------

    /// Replace the persisted pool wholesale. Runs in one transaction so a
    /// failure keeps the previous table contents.
    pub async fn replace_pool(&self, entries: &[(Category, String)]) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM pool_entries").execute(&mut *tx).await?;
        for (category, value) in entries {
            sqlx::query("INSERT OR IGNORE INTO pool_entries (category, value) VALUES (?, ?)")
                .bind(category.as_str())
                .bind(value)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Rebuild an [`crate::game::AttributePool`] from the persisted rows;
    /// the startup fallback when the sheet is unreachable.
    pub async fn load_pool(&self) -> Result<crate::game::AttributePool, sqlx::Error> {
        let rows = sqlx::query("SELECT category, value FROM pool_entries ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        let mut columns: Vec<(String, Vec<String>)> = Vec::new();
        for row in rows {
            let category: String = row.try_get("category")?;
            let value: String = row.try_get("value")?;
            match columns.iter_mut().find(|(name, _)| *name == category) {
                Some((_, values)) => values.push(value),
                None => columns.push((category, vec![value])),
            }
        }
        Ok(crate::game::AttributePool::from_columns(columns))
    }

    // ------------------------------------------------------------------
    // Dialog state
    // ------------------------------------------------------------------

    pub async fn dialog_json(&self, user_id: i64) -> Result<Option<String>, sqlx::Error> {
        let row = sqlx::query("SELECT state FROM dialogs WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| r.try_get("state")).transpose()
    }

    pub async fn set_dialog_json(&self, user_id: i64, state: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO dialogs (user_id, state, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(state)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear_dialog(&self, user_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM dialogs WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
