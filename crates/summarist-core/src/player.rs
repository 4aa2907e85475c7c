//! Audio player transport state.
//!
//! Tracks what a media element would report (position, duration, volume,
//! playing) and applies the transport controls to it. Producing sound is the
//! front end's job; it feeds element events back in through the `on_*`
//! methods.

use tracing::debug;

use crate::utils::format_playback_time;

/// Seconds jumped by the skip buttons.
pub const SKIP_SECONDS: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayer {
    source: Option<String>,
    playing: bool,
    position: f64,
    duration: f64,
    volume: f64,
}

impl Default for AudioPlayer {
    fn default() -> Self {
        Self {
            source: None,
            playing: false,
            position: 0.0,
            duration: 0.0,
            volume: 1.0,
        }
    }
}

impl AudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the player at a new track. Duration stays unknown (zero) until
    /// the metadata arrives.
    pub fn load(&mut self, source: &str) {
        debug!(source, "Loading audio");
        self.source = Some(source.to_string());
        self.playing = false;
        self.position = 0.0;
        self.duration = 0.0;
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Play if paused, pause if playing. Returns the new playing state.
    /// Without a loaded track there is nothing to play.
    pub fn toggle_play(&mut self) -> bool {
        if self.source.is_some() {
            self.playing = !self.playing;
        }
        self.playing
    }

    pub fn seek(&mut self, seconds: f64) {
        if seconds.is_finite() {
            self.position = seconds.clamp(0.0, self.duration);
        }
    }

    pub fn skip_back(&mut self) {
        self.seek(self.position - SKIP_SECONDS);
    }

    pub fn skip_forward(&mut self) {
        self.seek(self.position + SKIP_SECONDS);
    }

    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_finite() {
            self.volume = volume.clamp(0.0, 1.0);
        }
    }

    pub fn on_loaded_metadata(&mut self, duration: f64) {
        if duration.is_finite() && duration >= 0.0 {
            self.duration = duration;
            self.position = self.position.min(duration);
        }
    }

    pub fn on_time_update(&mut self, position: f64) {
        self.seek(position);
    }

    pub fn on_ended(&mut self) {
        self.playing = false;
        self.position = self.duration;
    }

    /// Fraction of the track played, `0.0` while the length is unknown.
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            self.position / self.duration
        } else {
            0.0
        }
    }

    /// `"m:ss / m:ss"` for the transport bar.
    pub fn time_label(&self) -> String {
        format!(
            "{} / {}",
            format_playback_time(self.position),
            format_playback_time(self.duration)
        )
    }
}
