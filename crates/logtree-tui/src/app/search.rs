use regex::Regex;

use logtree_core::FilterEntry;

/// Compiled namespace search
#[derive(Clone, Debug)]
pub struct NamespaceFilter {
    /// Regex pattern (None = match everything)
    regex: Option<Regex>,

    /// Original pattern string
    pattern: String,

    /// Case sensitivity
    case_insensitive: bool,
}

impl NamespaceFilter {
    /// Create a new filter from a pattern string
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, false)
    }

    /// Create a case-insensitive filter
    pub fn new_case_insensitive(pattern: &str) -> Result<Self, regex::Error> {
        Self::build(pattern, true)
    }

    fn build(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = match (pattern.is_empty(), case_insensitive) {
            (true, _) => None,
            (false, true) => Some(Regex::new(&format!("(?i){}", pattern))?),
            (false, false) => Some(Regex::new(pattern)?),
        };

        Ok(Self {
            regex,
            pattern: pattern.to_string(),
            case_insensitive,
        })
    }

    /// Does the entry's namespace or note match?
    pub fn matches(&self, entry: &FilterEntry) -> bool {
        match &self.regex {
            Some(re) => re.is_match(&entry.namespace) || re.is_match(&entry.note),
            None => true,
        }
    }

    /// Does a probe's namespace match? Posts (no namespace) always do.
    pub fn matches_namespace(&self, namespace: &str) -> bool {
        match &self.regex {
            Some(re) => namespace.is_empty() || re.is_match(namespace),
            None => true,
        }
    }

    /// Find all match positions in a string (for highlighting)
    pub fn find_matches(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.regex {
            Some(re) => re.find_iter(text).map(|m| (m.start(), m.end())).collect(),
            None => Vec::new(),
        }
    }

    /// Get the original pattern
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    /// Check if filter is empty (matches everything)
    pub fn is_empty(&self) -> bool {
        self.regex.is_none()
    }
}
