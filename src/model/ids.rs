//! Lightweight newtypes for the identifiers that flow through the pipeline.

use std::fmt;
use std::sync::Arc;

/// Provider-scoped game identifier (e.g. `"nfl:2026-401547"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct GameId(pub Arc<str>);

impl GameId {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Arc<str>>> From<T> for GameId {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// Exchange market ticker, e.g. `NFLTOT-26JAN03DENKC-T44`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MarketTicker(pub Arc<str>);

impl MarketTicker {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MarketTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Arc<str>>> From<T> for MarketTicker {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

/// A sport tag from the config's series map, e.g. `"nfl"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SportTag(pub Arc<str>);

impl SportTag {
    pub fn new(s: impl Into<Arc<str>>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SportTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<Arc<str>>> From<T> for SportTag {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}
