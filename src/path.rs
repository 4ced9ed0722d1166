//! Path manipulation utilities for configuration paths
//!
//! A configuration path is an ordered sequence of segments such as
//! `interfaces dummy dum0 address`. Operators type them as whitespace
//! separated words; values may be wrapped in single quotes.

/// Conversion into path segments.
///
/// Lets session operations accept either a typed path (`"interfaces dummy"`)
/// or pre-split segments, much like `AsRef<Path>` for filesystem calls.
pub trait IntoSegments {
    fn into_segments(self) -> Vec<String>;
}

impl IntoSegments for &str {
    fn into_segments(self) -> Vec<String> {
        split(self)
    }
}

impl IntoSegments for &String {
    fn into_segments(self) -> Vec<String> {
        split(self)
    }
}

impl IntoSegments for Vec<String> {
    fn into_segments(self) -> Vec<String> {
        self
    }
}

impl IntoSegments for &[String] {
    fn into_segments(self) -> Vec<String> {
        self.to_vec()
    }
}

impl IntoSegments for &Vec<String> {
    fn into_segments(self) -> Vec<String> {
        self.clone()
    }
}

impl<const N: usize> IntoSegments for [&str; N] {
    fn into_segments(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

/// Split a whitespace separated path into its segments.
///
/// Runs of whitespace never produce empty segments, so `"  a   b "` yields
/// `["a", "b"]` and the empty string yields an empty path.
pub fn split(path: &str) -> Vec<String> {
    path.split_whitespace().map(str::to_string).collect()
}

/// Join path segments back into their textual form.
pub fn join(path: &[String]) -> String {
    path.join(" ")
}

/// Strip the quotes a value was typed or saved with.
///
/// A value wrapped in double quotes loses exactly that pair. Otherwise one
/// single quote is removed from each end independently, matching how values
/// are typed at the command line: `'foo'` and `'foo` both become `foo`.
pub fn unquote(value: &str) -> &str {
    if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        return inner;
    }
    let value = value.strip_prefix('\'').unwrap_or(value);
    value.strip_suffix('\'').unwrap_or(value)
}

/// Quote a value for command output when it would not survive `tokenize`.
///
/// Values holding a single quote are wrapped in double quotes. A value
/// holding both quote characters cannot be written back; `Session::set`
/// refuses those.
pub fn quote(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '\'' || c == '"');
    if !needs_quotes {
        value.to_string()
    } else if value.contains('\'') {
        format!("\"{}\"", value)
    } else {
        format!("'{}'", value)
    }
}

/// Tokenise a command line tail, keeping quoted runs together.
///
/// `description 'uplink to core'` yields `["description", "'uplink to core'"]`
/// so the quotes can still be stripped by [`unquote`] when the value is stored.
/// A run opened by one quote character is closed only by the same character.
pub fn tokenize(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut open: Option<char> = None;

    for ch in line.chars() {
        match open {
            Some(q) if ch == q => {
                open = None;
                current.push(ch);
            }
            Some(_) => current.push(ch),
            None if ch == '\'' || ch == '"' => {
                open = Some(ch);
                current.push(ch);
            }
            None if ch.is_whitespace() => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            None => current.push(ch),
        }
    }

    if !current.is_empty() {
        words.push(current);
    }

    words
}
