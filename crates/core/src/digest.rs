//! Newtypes for the two digests the runner derives per invocation

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;

/// Identity of a test: digest of its attributes and relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

/// Identity of a test's compiled form: digest of the transpiled source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

macro_rules! digest_newtype {
    ($name:ident) => {
        impl $name {
            /// Wrap an already computed hex digest
            pub fn new(hex: impl Into<String>) -> Self {
                Self(hex.into())
            }

            /// Get the inner string
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Shortened form for log lines
            pub fn short(&self) -> &str {
                match self.0.char_indices().nth(12) {
                    Some((end, _)) => &self.0[..end],
                    None => &self.0,
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}

digest_newtype!(CacheKey);
digest_newtype!(ContentHash);
