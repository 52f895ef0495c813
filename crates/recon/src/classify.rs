use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{ExclusionRule, NormalizedSoftwareName};

/// Names longer than this (in characters) are treated as noise.
pub const MAX_NAME_CHARS: usize = 40;

/// Windows update packages such as `KB5066613`.
static WINDOWS_UPDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bkb\d{5,7}\b").expect("static pattern compiles"));

/// Why a raw name was discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoiseReason {
    Empty,
    /// `{...}` GUID-style installer identifiers.
    Placeholder,
    TooLong,
    WindowsUpdate,
    Excluded(String),
}

impl std::fmt::Display for NoiseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Placeholder => write!(f, "placeholder"),
            Self::TooLong => write!(f, "longer than {MAX_NAME_CHARS} chars"),
            Self::WindowsUpdate => write!(f, "windows update"),
            Self::Excluded(keyword) => write!(f, "excluded by '{keyword}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    Name(NormalizedSoftwareName),
    Noise(NoiseReason),
}

impl Classified {
    pub fn name(self) -> Option<NormalizedSoftwareName> {
        match self {
            Self::Name(name) => Some(name),
            Self::Noise(_) => None,
        }
    }
}

/// Noise filter + normalizer for raw software names.
///
/// Rules run in a fixed order: blank, `{` placeholder, length cap, Windows
/// update identifier, then configured exclusion keywords. The update check
/// does not depend on the keyword list.
pub struct Classifier {
    exclusions: Vec<ExclusionRule>,
}

impl Classifier {
    pub fn new(exclusions: &[ExclusionRule]) -> Self {
        Self {
            exclusions: exclusions.to_vec(),
        }
    }

    pub fn classify(&self, raw: &str) -> Classified {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Classified::Noise(NoiseReason::Empty);
        }
        if trimmed.starts_with('{') {
            return Classified::Noise(NoiseReason::Placeholder);
        }
        if trimmed.chars().count() > MAX_NAME_CHARS {
            return Classified::Noise(NoiseReason::TooLong);
        }
        if WINDOWS_UPDATE.is_match(trimmed) {
            return Classified::Noise(NoiseReason::WindowsUpdate);
        }

        let lowered = trimmed.to_lowercase();
        if let Some(rule) = self.exclusions.iter().find(|r| lowered.contains(r.keyword())) {
            return Classified::Noise(NoiseReason::Excluded(rule.keyword().to_string()));
        }

        Classified::Name(NormalizedSoftwareName::from_trimmed(trimmed))
    }

    /// Classify every raw record, keeping survivors in input order.
    /// Duplicates are kept.
    pub fn classify_all<'a, I>(&self, raw_names: I) -> Vec<NormalizedSoftwareName>
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let mut names = Vec::new();
        for raw in raw_names {
            let raw = raw.unwrap_or("");
            match self.classify(raw) {
                Classified::Name(name) => names.push(name),
                Classified::Noise(reason) => {
                    tracing::debug!(name = raw, %reason, "discarded software entry");
                }
            }
        }
        names
    }
}
