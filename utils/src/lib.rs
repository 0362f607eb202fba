//! Shared infrastructure utilities for glyphcycle.
//!
//! Filesystem helpers that don't belong in the IO-free `glyphcycle-types`
//! crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)

pub mod atomic_write;

pub use atomic_write::{
    AtomicWriteOptions, FileSyncPolicy, ParentDirSyncPolicy, atomic_write,
    atomic_write_new_with_options, atomic_write_with_options,
};
