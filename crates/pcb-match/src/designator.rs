use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference designator with natural ordering (R2 < R10), so sets of
/// designators read the way they appear on a board
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Designator(String);

impl Designator {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Designator {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Designator {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialOrd for Designator {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Designator {
    fn cmp(&self, other: &Self) -> Ordering {
        natord::compare(&self.0, &other.0)
    }
}
