use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CORRELATION_KEY, Selector};

/// Opaque token binding the resources created together for one catalog.
///
/// A token is minted once per discovery of a catalog directory and is never
/// reused: recreating a catalog always mints a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// Mint a new, globally unique token.
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Selector that matches every resource carrying this token.
    pub fn selector(&self) -> Selector {
        Selector::equals(CORRELATION_KEY, &self.0)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
