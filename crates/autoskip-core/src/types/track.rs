//! Track metadata.

use serde::{Deserialize, Serialize};

/// A track loaded into the player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    /// Player-assigned identifier.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Total length in seconds.
    pub duration_seconds: f64,
}

impl TrackInfo {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            duration_seconds: duration_seconds.max(0.0),
        }
    }

    /// Format the duration as MM:SS or HH:MM:SS.
    pub fn format_duration(&self) -> String {
        let total_secs = self.duration_seconds as u64;
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

impl std::fmt::Display for TrackInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {} [{}]", self.artist, self.title, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_format_duration() {
        assert_eq!(TrackInfo::new("1", "a", "b", 65.4).format_duration(), "1:05");
        assert_eq!(
            TrackInfo::new("1", "a", "b", 3661.0).format_duration(),
            "1:01:01"
        );
    }

    #[test]
    fn test_track_negative_duration_clamped() {
        assert_eq!(TrackInfo::new("1", "a", "b", -3.0).duration_seconds, 0.0);
    }

    #[test]
    fn test_track_display() {
        let track = TrackInfo::new("1", "Test Track", "Test Artist", 180.0);
        assert_eq!(track.to_string(), "Test Artist - Test Track [1]");
    }
}
