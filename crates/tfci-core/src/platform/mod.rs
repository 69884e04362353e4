//! Platform-specific utilities

/// POSIX-style path string utilities with zero allocation where possible
///
/// Change lists and test targets are repository-relative strings with `/`
/// separators regardless of the runner OS, so these helpers work on `&str`
/// rather than `Path`.
pub struct PathUtil;

impl PathUtil {
    /// Split path into non-empty components (zero-copy iterator)
    #[inline]
    pub fn components(path: &str) -> impl Iterator<Item = &str> {
        path.split('/').filter(|s| !s.is_empty())
    }

    /// Containing directory, with `dirname(1)` semantics
    ///
    /// `"a/b.tf"` -> `"a"`, `"b.tf"` -> `"."`, `"/b"` -> `"/"`, `"a/b/"` -> `"a"`.
    pub fn dirname(path: &str) -> &str {
        if path.is_empty() {
            return ".";
        }
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            return "/";
        }
        match trimmed.rfind('/') {
            None => ".",
            Some(pos) => {
                let dir = trimmed[..pos].trim_end_matches('/');
                if dir.is_empty() {
                    "/"
                } else {
                    dir
                }
            }
        }
    }

    /// Final path segment, ignoring trailing separators
    pub fn basename(path: &str) -> &str {
        let trimmed = path.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(pos) => &trimmed[pos + 1..],
            None => trimmed,
        }
    }

    /// Drop any number of leading `./` prefixes
    #[inline]
    pub fn strip_current_dir(path: &str) -> &str {
        let mut rest = path;
        while let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped.trim_start_matches('/');
        }
        rest
    }

    /// Whether any component equals `segment`
    #[inline]
    pub fn has_component(path: &str, segment: &str) -> bool {
        Self::components(path).any(|c| c == segment)
    }

    /// Cut the path before the first `/{segment}` component
    ///
    /// The leading component never matches, so `"tests/x"` is returned as-is.
    pub fn truncate_at_component<'p>(path: &'p str, segment: &str) -> &'p str {
        let mut offset: usize = 0;
        for (i, part) in path.split('/').enumerate() {
            if i > 0 && part == segment {
                return path[..offset.saturating_sub(1)].trim_end_matches('/');
            }
            offset += part.len() + 1;
        }
        path
    }
}
