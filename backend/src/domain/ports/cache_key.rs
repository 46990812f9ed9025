//! Cache key type shared by count cache adapters.

/// Key under which a listing's total count is cached.
///
/// Keys are sanitized by removing every whitespace character, so callers may
/// build them from user-supplied keywords without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountCacheKey(String);

impl CountCacheKey {
    /// Strip all whitespace from `raw`; returns `None` when nothing remains,
    /// which callers treat as "do not cache".
    pub fn sanitize(raw: &str) -> Option<Self> {
        let cleaned: String = raw.split_whitespace().collect();
        (!cleaned.is_empty()).then_some(Self(cleaned))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CountCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CountCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::CountCacheKey;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_keys_are_not_cacheable(#[case] value: &str) {
        assert!(CountCacheKey::sanitize(value).is_none());
    }

    #[rstest]
    #[case("latest-rank-all", "latest-rank-all")]
    #[case(" rna seq -rank- week ", "rnaseq-rank-week")]
    #[case("tags\n", "tags")]
    fn whitespace_is_removed(#[case] raw: &str, #[case] expected: &str) {
        let key = CountCacheKey::sanitize(raw).expect("key survives");
        assert_eq!(key.as_str(), expected);
    }
}
