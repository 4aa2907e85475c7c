/// Format a playback position as `m:ss` for the transport bar.
/// Non-finite or negative input shows as `0:00`.
pub fn format_playback_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Format a track length the way the book page shows it: `X min Y sec`
pub fn format_audio_length(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0 min 0 sec".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{} min {} sec", total / 60, total % 60)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a rating for display, one decimal place
pub fn format_rating(rating: f64) -> String {
    format!("{:.1}", rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_playback_time() {
        assert_eq!(format_playback_time(0.0), "0:00");
        assert_eq!(format_playback_time(9.7), "0:09");
        assert_eq!(format_playback_time(75.0), "1:15");
        assert_eq!(format_playback_time(3600.0), "60:00");
        assert_eq!(format_playback_time(f64::NAN), "0:00");
        assert_eq!(format_playback_time(-3.0), "0:00");
    }

    #[test]
    fn test_format_audio_length() {
        assert_eq!(format_audio_length(0.0), "0 min 0 sec");
        assert_eq!(format_audio_length(263.4), "4 min 23 sec");
        assert_eq!(format_audio_length(f64::INFINITY), "0 min 0 sec");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("Café au lait", 7), "Café...");
    }

    #[test]
    fn test_format_rating() {
        assert_eq!(format_rating(4.44), "4.4");
        assert_eq!(format_rating(5.0), "5.0");
    }
}
