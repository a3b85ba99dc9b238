//! Filesystem primitives for ConfigHub
//!
//! Provides the crash-safe, lock-protected I/O used by the last-known-good
//! cache. Every write goes through a temp file in the target directory and
//! an atomic rename, so readers only ever observe a complete document.

pub mod error;
pub mod io;

pub use error::{Error, Result};
pub use io::{modified_at, read_locked, remove_if_exists, write_atomic};
