//! Pulling GitHub listings into the local store.
//!
//! ```ignore
//! use omg::sync::{SyncOptions, sync_stars};
//!
//! let result = sync_stars(&client, &store, &SyncOptions::default()).await?;
//! println!("{} stars saved over {} pages", result.saved, result.pages);
//! ```

pub mod engine;
mod types;

pub use engine::{sync_repos, sync_stars, unstar};
pub use types::{SyncOptions, SyncResult};
