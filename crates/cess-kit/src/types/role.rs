//! On-chain roles an identity can register for.

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// A network role.
///
/// Parsed once from user input; the many historical spellings
/// (`oss`, `DeOSS`, `bucket`, `SMINER`, ...) all resolve here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A storage miner (`Sminer` pallet).
    StorageProvider,
    /// A decentralized object-storage gateway (`Oss` pallet).
    Gateway,
}

impl Role {
    /// Canonical short name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::StorageProvider => "storage_provider",
            Role::Gateway => "gateway",
        }
    }
}

impl FromStr for Role {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gateway" | "oss" | "deoss" => Ok(Role::Gateway),
            "storage_provider" | "storageprovider" | "bucket" | "sminer" | "miner" => {
                Ok(Role::StorageProvider)
            }
            _ => Err(InputError::UnknownRole(s.to_string())),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
