//! topeleven-core library.
//!
//! Ranked "Top-11" lists organized as `MainCategory -> SubCategory`, where a
//! sub-category item can be projected into its parent main category through a
//! [`model::Reference`] at an independent rank.
//!
//! # Conventions
//!
//! - **Errors**: domain operations return [`error::TopElevenError`]; setup
//!   paths (opening files, parsing config) return `anyhow::Result`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).
//! - **Transactions**: every mutation runs inside [`db::Store::write`].

pub mod access;
pub mod alloc;
pub mod catalog;
pub mod config;
pub mod convert;
pub mod db;
pub mod error;
pub mod lock;
pub mod model;
pub mod reconcile;
pub mod reposition;

pub use error::{ErrorKind, TopElevenError};
pub use model::{EntryHandle, ListEntry, ListId, Position};
