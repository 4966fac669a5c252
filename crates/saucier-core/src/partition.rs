//! Public/private record partitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two isolated databases in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Private,
    Public,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Private, Partition::Public];

    /// Value used for the `database` location parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Private => "private",
            Partition::Public => "public",
        }
    }

    /// Path segment of the database in CloudKit Web Services URLs.
    pub fn database_scope(self) -> &'static str {
        self.as_str()
    }

    pub fn label(self) -> &'static str {
        match self {
            Partition::Private => "My Recipes",
            Partition::Public => "Public Recipes",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a `database` value that names no partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPartition(pub String);

impl fmt::Display for UnknownPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown database '{}' (expected private or public)", self.0)
    }
}

impl std::error::Error for UnknownPartition {}

impl FromStr for Partition {
    type Err = UnknownPartition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Partition::Private),
            "public" => Ok(Partition::Public),
            other => Err(UnknownPartition(other.to_string())),
        }
    }
}
