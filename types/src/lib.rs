//! Core domain types for glyphcycle.
//!
//! This crate contains the circular glyph substitution engine with no IO and
//! minimal dependencies:
//!
//! - **`cycle`**: [`Cycle`] declarations and the immutable [`CycleMap`] built from them
//! - **`substitute`**: replacing the glyph just before a byte offset in a text buffer
//!
//! Nothing here logs or prints. Errors are returned to the caller, which owns
//! all user-facing reporting.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod cycle;
mod substitute;

pub use cycle::{Cycle, CycleMap, Direction, InvalidCycle};
pub use substitute::{SubstituteError, substitute, substitute_str};
