//! Utility functions for display formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{format_audio_length, format_playback_time, format_rating, truncate_string};
