//! CLI command implementations.

pub mod compact;
pub mod dump_journal;
pub mod inspect;
pub mod sync;

use renoscope_core::{LocalStore, StoreConfig};
use std::path::Path;

/// Opens an existing store; the commands never create one.
pub fn open_store(path: &Path) -> Result<LocalStore, Box<dyn std::error::Error>> {
    Ok(LocalStore::open(path, StoreConfig::default().create_if_missing(false))?)
}
