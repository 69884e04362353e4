//! Change list parsing

/// One entry of the comma-separated change list, trimmed and unquoted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeItem<'a>(&'a str);

impl<'a> ChangeItem<'a> {
    /// Borrow the cleaned path
    #[inline]
    pub fn as_str(&self) -> &'a str {
        self.0
    }
}

impl std::fmt::Display for ChangeItem<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

#[inline]
fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Clean a single raw token
///
/// Trims, removes one leading and one trailing quote (independently), then
/// trims again so that `" foo "` and `foo` are the same item.
pub fn clean_token(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix(is_quote) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix(is_quote) {
        s = rest;
    }
    s.trim()
}

/// Split a raw change list into items, dropping empty tokens (zero-copy)
pub fn parse_changes(raw: &str) -> Vec<ChangeItem<'_>> {
    raw.split(',')
        .map(clean_token)
        .filter(|s| !s.is_empty())
        .map(ChangeItem)
        .collect()
}
