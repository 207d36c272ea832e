// State management module
// Handles the shared handles passed to every request

pub mod app_state;

pub use app_state::AppState;
