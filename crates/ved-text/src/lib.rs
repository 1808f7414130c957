//! # ved-text — text document snapshots and position arithmetic
//!
//! The leaf crate of the ved workspace. It knows nothing about modes,
//! commands, or windows — only text and positions:
//!
//! - **[`document`]** — immutable [`Document`](document::Document) snapshots
//!   (rope + cursor offset) with line/column translation, line and document
//!   boundaries, and pure edit constructors that produce new snapshots
//! - **[`word`]** — word-boundary arithmetic over a document: next/previous
//!   word beginnings and endings, and current-word boundaries
//!
//! Everything here is a pure function of `(text, offset)`. Mutation never
//! happens in place: editing produces a fresh `Document`, and the owner
//! swaps its reference atomically.

pub mod document;
pub mod word;

pub use document::Document;
