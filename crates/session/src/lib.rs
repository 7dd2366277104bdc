//! uirec Recording Session
//!
//! Drives one recording from launch to extension:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Session                              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  start()           -> CodegenProcess + ArtifactWatcher       │
//! │  wait_for_exit()   -> drains changes through the transformer │
//! │  stop()            -> kill, close watcher, final code        │
//! │  finish()          -> Prompt -> Save -> Edit -> Extend       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ArtifactWatcher                                             │
//! │    ├── poll until the artifact exists                        │
//! │    └── notify on modification, re-read, drop duplicates      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod codegen;
pub mod editor;
pub mod session;
pub mod watcher;

pub use codegen::{CodegenOptions, CodegenProcess, Viewport};
pub use editor::EditOutcome;
pub use session::{ExtendOutcome, Extension, FinishOptions, FinishedRecording, Phase, Session};
pub use watcher::{ArtifactWatcher, ChangeFilter};
