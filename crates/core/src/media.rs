//! Media type allow-listing and resolution.
//!
//! Uploads carry their media type in several optional places. The first
//! non-empty candidate wins; when none is present the type is sniffed from
//! the decoded bytes. The resolved type is then checked against the
//! configured [`AllowList`].

/// Type reported for unrecognized binary content.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Type reported for unrecognized content that is valid UTF-8 text.
pub const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// A single allow-list entry, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Rule {
    /// Exact media type, e.g. `image/png`.
    Exact(String),
    /// Whole category from a `category/*` entry, stored as `category/`.
    Category(String),
}

/// Configured set of acceptable media types.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    rules: Vec<Rule>,
}

impl AllowList {
    /// Build an allow-list from configured entries.
    ///
    /// Entries of the shape `category/*` match any type in that category;
    /// every other entry must match exactly. Matching is case-insensitive.
    #[must_use]
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules = entries
            .into_iter()
            .filter_map(|entry| {
                let entry = entry.as_ref().trim().to_ascii_lowercase();
                if entry.is_empty() {
                    return None;
                }
                Some(match entry.strip_suffix("/*") {
                    Some(category) if !category.is_empty() => Rule::Category(format!("{category}/")),
                    _ => Rule::Exact(entry),
                })
            })
            .collect();

        Self { rules }
    }

    /// Whether `media_type` is permitted.
    ///
    /// Exact entries are tried before category wildcards. An empty candidate
    /// is never permitted.
    #[must_use]
    pub fn permits(&self, media_type: &str) -> bool {
        let candidate = media_type.trim().to_ascii_lowercase();
        if candidate.is_empty() {
            return false;
        }

        let exact = self
            .rules
            .iter()
            .any(|rule| matches!(rule, Rule::Exact(t) if *t == candidate));

        exact
            || self
                .rules
                .iter()
                .any(|rule| matches!(rule, Rule::Category(prefix) if candidate.starts_with(prefix.as_str())))
    }
}

/// Detect a media type from content.
///
/// Magic-byte signatures come first; otherwise UTF-8 text without NUL bytes
/// is reported as plain text and anything else as an octet stream.
#[must_use]
pub fn sniff(data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    if std::str::from_utf8(data).is_ok() && !data.contains(&0) {
        PLAIN_TEXT.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

/// Resolve a media type from ordered candidates, sniffing `data` as a last
/// resort.
///
/// Candidates are tried in order; the first one that is non-empty after
/// trimming wins.
pub fn resolve<'a, I>(candidates: I, data: &[u8]) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|candidate| !candidate.is_empty())
        .map_or_else(|| sniff(data), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    fn default_list() -> AllowList {
        AllowList::new(oneshot_shared::AppConfig::default_allowed_types())
    }

    #[rstest]
    #[case("image/png", true)]
    #[case("IMAGE/PNG", true)]
    #[case("Audio/Mpeg", true)]
    #[case("image/x-icon", true)] // via image/*
    #[case("image/tiff", true)]
    #[case("audio/flac", false)]
    #[case("application/zip", false)]
    #[case("text/plain; charset=utf-8", false)]
    #[case("", false)]
    #[case("   ", false)]
    fn test_default_allow_list(#[case] media_type: &str, #[case] allowed: bool) {
        assert_eq!(default_list().permits(media_type), allowed);
    }

    #[test]
    fn test_category_wildcard_requires_separator() {
        let list = AllowList::new(["image/*"]);

        assert!(list.permits("image/avif"));
        assert!(!list.permits("imagex/png"));
        assert!(!list.permits("image"));
    }

    #[test]
    fn test_only_category_wildcards_supported() {
        let list = AllowList::new(["*/*", "image/p*"]);

        // "*/*" is a category named "*", "image/p*" is an exact string.
        assert!(!list.permits("image/png"));
        assert!(list.permits("IMAGE/P*"));
    }

    #[test]
    fn test_empty_list_permits_nothing() {
        let list = AllowList::new(Vec::<String>::new());

        assert!(!list.permits("image/png"));
        assert!(!list.permits("text/plain"));
    }

    #[test]
    fn test_sniff_png() {
        assert_eq!(sniff(PNG_HEADER), "image/png");
    }

    #[test]
    fn test_sniff_text_and_binary_fallbacks() {
        assert_eq!(sniff(b"hello world"), PLAIN_TEXT);
        assert_eq!(sniff(&[0x00, 0x01, 0x02, 0xff]), OCTET_STREAM);
    }

    #[test]
    fn test_resolve_first_non_empty_wins() {
        let resolved = resolve([None, Some("  "), Some("audio/ogg"), Some("image/png")], PNG_HEADER);
        assert_eq!(resolved, "audio/ogg");
    }

    #[test]
    fn test_resolve_falls_back_to_sniffing() {
        let resolved = resolve([None, Some(""), None], PNG_HEADER);
        assert_eq!(resolved, "image/png");
    }
}
