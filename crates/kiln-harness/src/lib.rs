#![forbid(unsafe_code)]

//! Deterministic harness for kiln components.
//!
//! - [`MemoryHost`]: an in-memory [`Host`](kiln_runtime::Host) with
//!   controllable write acknowledgement, write rejection and unmounting.
//! - [`Node`]: a minimal host node tree with click handlers.
//! - [`Harness`]: a component mounted on a `MemoryHost` and driven by a
//!   single-threaded executor, so interleaved dispatches replay the same
//!   way every run.

pub mod harness;
pub mod host;
pub mod node;

pub use harness::Harness;
pub use host::{AckMode, MemoryHost};
pub use node::{Node, text_content};
