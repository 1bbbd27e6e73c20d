//! Resource classification by URL pattern.

use std::sync::LazyLock;

use regex::RegexSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::policy::CLASSIFICATION_RULES;

/// Resource class of a request URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Static,
    Images,
    Html,
    Api,
    Default,
}

/// Ordered (class, pattern set) rules. First match wins.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<(ResourceClass, RegexSet)>,
}

impl Classifier {
    pub fn new(rules: &[(ResourceClass, &[&str])]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|(class, patterns)| Ok((*class, RegexSet::new(*patterns)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// Patterns are tested against the full URL string, query included.
    pub fn classify(&self, url: &str) -> ResourceClass {
        self.rules
            .iter()
            .find(|(_, set)| set.is_match(url))
            .map(|(class, _)| *class)
            .unwrap_or(ResourceClass::Default)
    }
}

static SITE_CLASSIFIER: LazyLock<Classifier> =
    LazyLock::new(|| Classifier::new(CLASSIFICATION_RULES).expect("built-in classification patterns are valid"));

/// Classify with the site's built-in rules.
pub fn classify(url: &str) -> ResourceClass {
    SITE_CLASSIFIER.classify(url)
}
