//! Invoice Tracker Backend Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod blob_store;
pub mod config;
pub mod error;
pub mod services;
/// Application state management
///
/// Handles the store handles shared by every request.
pub mod state;
pub mod store;
