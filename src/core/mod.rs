//! core/mod.rs
//!
//! The brain of the tool:
//! - Collect and compile per-field editors (`script`)
//! - Discover input files (`library`)
//! - Read/write tags (`tags`)
//! - Run editors over each file and report (`apply`, `report`)
//!
//! The pipeline is explicit and runs strictly in this order:
//!   (A) flags -> Registry -> EditorSet (fatal on any compile error)
//!   (B) discover paths -> Vec<PathBuf>
//!   (C) for each path: open -> edit -> save -> close
//!
//! Nothing in here prints except `report`, and nothing in here exits the process.

pub mod apply;
pub mod check;
pub mod library;
pub mod report;
pub mod script;
pub mod tags;
pub mod types;
