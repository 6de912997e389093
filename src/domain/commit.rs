use regex::Regex;

/// First line of a commit message, the only part markers are matched against.
///
/// A line ends at a real newline or at a literal `\n` escape sequence, since CI
/// systems often hand the message over with escaped newlines.
pub fn first_line(message: &str) -> &str {
    match Regex::new(r"\\n|\r?\n")
        .ok()
        .and_then(|re| re.find(message))
    {
        Some(m) => &message[..m.start()],
        None => message,
    }
}

/// Case-insensitive substring check for a marker.
///
/// An empty marker is treated as unset and never matches.
pub fn contains_marker(message: &str, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    message.to_lowercase().contains(&marker.to_lowercase())
}
