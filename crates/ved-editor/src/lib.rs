//! # ved-editor — Editor core for ved
//!
//! The modal heart of the editor, layered leaf-first:
//!
//! - **[`key`]** — `KeyPress` events with key codes and modifier flags
//! - **[`state`]** — input modes, pending operators, per-session Vi state
//! - **[`register`]** — clipboard payloads and named registers
//! - **[`history`]** — append-only persisted line logs (command / search)
//! - **[`storage`]** — the storage collaborator trait and local-file backend
//! - **[`search`]** — wrap-aware regex search over a buffer's working lines
//! - **[`grammar`]** — the `:` command-line grammar (ordered alternatives)
//! - **[`text_object`]** — motions and text objects consumed by operators
//! - **[`buffer`]** — a file buffer: document snapshots, undo, marks, options
//! - **[`commands`]** — the command registry and range operations
//! - **[`editor`]** — the editor itself: buffers, options, messages, dot-repeat
//! - **[`vi`]** — the key processor driving modal state transitions

pub mod buffer;
pub mod commands;
pub mod editor;
pub mod grammar;
pub mod history;
pub mod key;
pub mod register;
pub mod search;
pub mod state;
pub mod storage;
pub mod text_object;
pub mod vi;

pub use editor::Editor;
pub use vi::KeyProcessor;
