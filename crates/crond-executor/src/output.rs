//! Cleaning and clipping of captured command output.
//!
//! Job output ends up in log lines and monitoring events, both of which have
//! practical size limits. The tail is kept because the last lines of a
//! failing command usually carry the error.

/// Default maximum characters kept from a stream.
pub const DEFAULT_MAX_CHARS: usize = 4_096;

/// Strip ANSI escape codes and decode as (lossy) UTF-8.
pub fn clean(raw: &[u8]) -> String {
    let stripped = strip_ansi_escapes::strip(raw);
    String::from_utf8_lossy(&stripped).trim_end().to_string()
}

/// Keep at most `max_chars` characters from the end of `text`, prefixed by a
/// marker saying how much was dropped. Splits on character boundaries.
pub fn clip_tail(text: &str, max_chars: usize) -> String {
    let total = text.chars().count();
    if total <= max_chars {
        return text.to_owned();
    }
    let omitted = total - max_chars;
    let tail: String = text.chars().skip(omitted).collect();
    format!("[{omitted} chars omitted] ...{tail}")
}
