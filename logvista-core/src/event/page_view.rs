use regex::{RegexSet, RegexSetBuilder};

pub const DEFAULT_STATUS_CODES: &[u16] = &[200];
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] =
    &["favicon", "sitemap", "rss", r"robots\.txt", "^/_nuxt"];

/// Process-wide page-view rules, compiled once before scanning starts.
#[derive(Debug, Clone)]
pub struct PageViewFilter {
    status_codes: Vec<u16>,
    excluded: RegexSet,
}

impl PageViewFilter {
    /// Patterns are regular expressions matched case-insensitively against the decoded path.
    pub fn new<I, P>(status_codes: I, exclude_patterns: &[P]) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = u16>,
        P: AsRef<str>,
    {
        let excluded = RegexSetBuilder::new(exclude_patterns.iter().map(AsRef::as_ref))
            .case_insensitive(true)
            .build()?;

        let mut status_codes: Vec<u16> = status_codes.into_iter().collect();
        status_codes.sort_unstable();
        status_codes.dedup();

        Ok(Self {
            status_codes,
            excluded,
        })
    }

    pub fn is_page_view(&self, status: u16, path: &str) -> bool {
        self.status_codes.binary_search(&status).is_ok() && !self.excluded.is_match(path)
    }
}

impl Default for PageViewFilter {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_CODES.iter().copied(), DEFAULT_EXCLUDE_PATTERNS)
            .expect("default exclude patterns are valid")
    }
}
