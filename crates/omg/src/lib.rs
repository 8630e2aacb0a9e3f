//! omg - a local mirror of your GitHub repositories and stars.
//!
//! Listings are pulled page by page from the GitHub API and upserted into a
//! SQLite store, which can then be searched offline by keyword and language.
//! The client also covers a handful of one-shot calls (profile, commits,
//! releases, asset downloads, unstarring) and scrapes the trending page.
//!
//! # Features
//!
//! - `sqlite` - SQLite driver for the store (default).
//! - `migrate` - Schema migrations; enables [`connect_and_migrate`] and
//!   [`Store::open`] (default).
//!
//! # Example
//!
//! ```ignore
//! use omg::{Config, Store, sync};
//!
//! let config = Config::load();
//! let store = Store::open(&config.database_url().unwrap()).await?;
//! let client = config.github_client()?;
//!
//! sync::sync_stars(&client, &store, &config.sync_options()).await?;
//! for star in store.query_stars(Some("parser"), Some("rust")).await? {
//!     let name = star.repo.full_name.unwrap_or_default();
//!     println!("{} {name}", star.starred_at.unwrap_or_default());
//! }
//! ```

pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod github;
pub mod http;
pub mod repository;
pub mod sync;

#[cfg(feature = "migrate")]
pub mod migration;

pub use config::Config;
pub use db::connect;
#[cfg(feature = "migrate")]
pub use db::connect_and_migrate;
pub use error::{OmgError, Result};
pub use github::GitHubClient;
pub use repository::Store;
