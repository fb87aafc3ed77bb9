//! Core domain + application logic for the video downloader bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and yt-dlp live
//! behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod delivery;
pub mod domain;
pub mod download;
pub mod errors;
pub mod intent;
pub mod logging;
pub mod messaging;
pub mod router;

pub use errors::{Error, Result};
