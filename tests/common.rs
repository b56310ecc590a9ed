//! Test utilities & fixtures shared by the integration tests.

use tokio::sync::{Mutex, RwLock};

use bunkerbot::bot::BotState;
use bunkerbot::config::SheetConfig;
use bunkerbot::game::{ops, Allocator, AttributePool, Category};
use bunkerbot::sheets::SheetClient;
use bunkerbot::storage::{Player, Storage};

#[allow(dead_code)]
pub const ADMIN_ID: i64 = 999;

/// A fresh isolated in-memory database.
#[allow(dead_code)]
pub async fn storage() -> Storage {
    Storage::in_memory().await.expect("in-memory storage")
}

fn column(name: &str, prefix: &str, count: usize) -> (String, Vec<String>) {
    (
        name.to_string(),
        (1..=count).map(|i| format!("{} {}", prefix, i)).collect(),
    )
}

/// A pool with plenty of values in every category.
#[allow(dead_code)]
pub fn test_pool() -> AttributePool {
    AttributePool::from_columns(vec![
        column("biology", "Bio", 10),
        column("profession", "Job", 10),
        column("health", "Health", 10),
        column("hobby", "Hobby", 10),
        column("luggage", "Item", 12),
        column("fact", "Fact", 10),
        column("special", "Card", 12),
    ])
}

/// A pool where one category is deliberately tiny.
#[allow(dead_code)]
pub fn tight_pool(category: Category, values: &[&str]) -> AttributePool {
    let mut columns = vec![
        column("biology", "Bio", 10),
        column("profession", "Job", 10),
        column("health", "Health", 10),
        column("hobby", "Hobby", 10),
        column("luggage", "Item", 12),
        column("fact", "Fact", 10),
        column("special", "Card", 12),
    ];
    columns.retain(|(name, _)| name != category.as_str());
    columns.push((
        category.as_str().to_string(),
        values.iter().map(|v| v.to_string()).collect(),
    ));
    AttributePool::from_columns(columns)
}

/// Create an active room and return its code.
#[allow(dead_code)]
pub async fn open_room(storage: &Storage, alloc: &mut Allocator) -> String {
    ops::create_room(storage, alloc, 4).await.expect("create room")
}

/// Join a user into a room with the standard test pool.
#[allow(dead_code)]
pub async fn join(
    storage: &Storage,
    pool: &AttributePool,
    alloc: &mut Allocator,
    user_id: i64,
    code: &str,
    name: &str,
) -> Player {
    ops::join_room(storage, pool, alloc, user_id, None, code, name)
        .await
        .expect("join room")
}

/// Bot state wired to an in-memory database and a seeded allocator; the
/// sheet client points nowhere and is never called by these tests.
#[allow(dead_code)]
pub async fn bot_state(seed: u64) -> BotState {
    BotState {
        storage: storage().await,
        pool: RwLock::new(test_pool()),
        allocator: Mutex::new(Allocator::with_seed(seed)),
        sheets: SheetClient::new(SheetConfig {
            spreadsheet_id: String::new(),
            api_key: String::new(),
            range: "A1:Z100".to_string(),
            timeout_secs: 1,
        }),
        admin_id: ADMIN_ID,
        room_code_length: 4,
    }
}
