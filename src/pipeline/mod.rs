//! Per-run pipeline stages.
//!
//! Each submodule implements exactly one step of the batch so each is
//! testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! walk ──▶ input ──▶ invoke ──▶ markers ──▶ cleanup (opt-in)
//! (tasks)  (bytes)   (engine)   (tags)      (noise)
//! ```
//!
//! 1. [`walk`]     discover PDFs and compute their mirrored `.md` / `.log` paths
//! 2. [`input`]    read a PDF from disk and validate its header
//! 3. [`invoke`]   run the extraction engine on the blocking pool
//! 4. [`markers`]  turn the structured document into tagged Markdown
//! 5. [`cleanup`]  optional noise reduction of the final text

pub mod cleanup;
pub mod input;
pub mod invoke;
pub mod markers;
pub mod walk;
