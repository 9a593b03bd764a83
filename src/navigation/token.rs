//! Navigation sequence numbers.

use std::fmt;

/// Per-instance sequence number minted for every navigation attempt.
///
/// Only the highest-issued token may commit; completions carrying an
/// older token are discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NavigationToken(u64);

impl NavigationToken {
    /// Token held by an instance before its first navigation.
    pub const INITIAL: NavigationToken = NavigationToken(0);

    /// The token issued after this one.
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NavigationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
