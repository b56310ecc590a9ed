//! # Game Rules Module
//!
//! Everything that makes "Bunker" a game and not a chat frontend lives
//! here:
//!
//! - [`category`] - the closed set of character-card categories
//! - [`allocator`] - seedable random drawing without replacement
//! - [`pool`] - the current snapshot of candidate values per category
//! - [`ops`] - room lifecycle and the admin mutation operations
//! - [`errors`] - the domain error taxonomy
//!
//! Operations in [`ops`] work purely against [`crate::storage::Storage`]
//! and return typed outcomes; rendering chat text and delivering player
//! notifications is the bot layer's job. Every multi-row mutation is one
//! all-or-nothing transaction: an allocator failure mid-operation leaves
//! no partial write behind.

pub mod allocator;
pub mod category;
pub mod errors;
pub mod ops;
pub mod pool;

pub use allocator::Allocator;
pub use category::Category;
pub use errors::GameError;
pub use pool::AttributePool;
