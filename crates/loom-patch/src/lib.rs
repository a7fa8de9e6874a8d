//! Loom patch engine
//!
//! Text patches between revisions of a loom tree.
//!
//! # Core Concepts
//!
//! - [`Patch`]: Opaque, serializable difference between two texts
//! - [`PatchEngine`]: Contract for producing and applying patches
//! - [`TextPatchEngine`]: Character-level engine built on `similar`
//! - [`PatchOutcome`]: Patched text plus per-hunk success flags
//!
//! # Example
//!
//! ```rust
//! use loom_patch::{PatchEngine, TextPatchEngine};
//!
//! let engine = TextPatchEngine::new();
//! let patch = engine.diff("Hello", "Hello world");
//! let outcome = engine.apply(&patch, "Hello");
//! assert_eq!(outcome.text, "Hello world");
//! assert!(outcome.is_clean());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod engine;
mod patch;

pub use engine::{PatchEngine, TextPatchEngine, DEFAULT_CONTEXT_CHARS, DEFAULT_DIFF_TIMEOUT};
pub use patch::{Hunk, Patch, PatchError, PatchOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
