#![doc = "extension-mirror: incrementally mirror a wiki extension catalog onto local disk."]

//! The catalog is queried once per run; entries whose version marker already
//! matches are skipped, the rest are fetched by git checkout or archive
//! download and swapped into `src/<kind>/<name>`.
//!
//! Start at [`synchronise::SyncEngine`]; the collaborator seams are in
//! [`contract`].

pub mod catalog;
pub mod cli;
pub mod config;
pub mod contract;
pub mod download;
pub mod error;
pub mod error_log;
pub mod extract;
pub mod http;
pub mod layout;
pub mod load_config;
pub mod normalize;
pub mod repo_url;
pub mod synchronise;
pub mod version_store;

pub use cli::{run, Cli};
