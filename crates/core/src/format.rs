/// Human duration: `45min`, `2h`, `1h30min`.
#[must_use]
pub fn format_duration(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes}min");
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{hours}h{rest}min")
    } else {
        format!("{hours}h")
    }
}

/// Cut `text` to at most `max_chars` characters, appending `...` when shortened.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "0min");
        assert_eq!(format_duration(45), "45min");
        assert_eq!(format_duration(60), "1h");
        assert_eq!(format_duration(90), "1h30min");
        assert_eq!(format_duration(125), "2h5min");
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_text("Rust", 4), "Rust");
        assert_eq!(truncate_text("Rust", 10), "Rust");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate_text("débutant", 3), "déb...");
        assert_eq!(truncate_text("abcdef", 0), "...");
    }
}
