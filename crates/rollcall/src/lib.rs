//! `rollcall` - Offline roster and QR check-in attendance tracker
//!
//! This library keeps a student roster and a daily attendance log in a local
//! database, marks students present from scanned QR payloads, and renders
//! dashboards, reports, searches and CSV exports from that state.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod model;
pub mod registry;
pub mod scan;
pub mod search;
pub mod storage;
pub mod views;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{AttendanceRecord, AttendanceStatus, QrPayload, Student};
pub use registry::{MarkOutcome, Registry, Removal};
pub use storage::{Storage, StorageStats};
