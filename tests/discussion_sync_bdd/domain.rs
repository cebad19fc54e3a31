//! Step argument types for the discussion sync BDD tests.

use std::str::FromStr;

/// Comma-separated discussion numbers, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiscussionNumbers(Vec<u64>);

impl DiscussionNumbers {
    pub(crate) fn as_slice(&self) -> &[u64] {
        &self.0
    }
}

impl FromStr for DiscussionNumbers {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(|part| part.trim().parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}
