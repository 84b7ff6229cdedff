//! Format and ruleset identifiers

use std::fmt;

use rotom_dex::to_id;
use serde::{Deserialize, Serialize};

/// Normalized format id, e.g. `gen9ou`.
///
/// Built from any spelling the caller has (`"[Gen 9] OU"`, `"gen9 ou"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FormatId(String);

impl FormatId {
    pub fn new(name: &str) -> Self {
        Self(to_id(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generation encoded in the id (`gen9ou` -> 9)
    pub fn generation(&self) -> Option<u8> {
        let rest = self.0.strip_prefix("gen")?;
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}

impl From<String> for FormatId {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl From<&str> for FormatId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<FormatId> for String {
    fn from(id: FormatId) -> Self {
        id.0
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One published revision of a format's rules
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RulesetId {
    pub format: FormatId,
    pub revision: u32,
}

impl RulesetId {
    pub fn new(format: impl Into<FormatId>, revision: u32) -> Self {
        Self {
            format: format.into(),
            revision,
        }
    }
}

impl fmt::Display for RulesetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.format, self.revision)
    }
}
