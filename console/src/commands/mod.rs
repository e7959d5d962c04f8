//! Console commands
//!
//! One module per command family. Every command prints its own failure
//! line on the terminal and then hands the result back to the dispatcher,
//! which only uses it to decide session state updates.

pub mod card;
pub mod dir;
pub mod mount;
pub mod stream;
pub mod tree;

pub use tree::{tree, walk, WalkSummary};
