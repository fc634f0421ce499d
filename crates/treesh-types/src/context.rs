//! Session context consumed by path resolution.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::path::CanonicalPath;

/// Who is resolving and from where.
///
/// Supplied by the caller on every resolution; the resolver never mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathContext {
    /// Session user, if known. Drives home-shorthand expansion.
    pub user: Option<String>,
    /// Current working directory.
    pub cwd: CanonicalPath,
}

impl PathContext {
    pub fn new(user: Option<String>, cwd: CanonicalPath) -> Self {
        Self { user, cwd }
    }

    /// Anonymous context rooted at `/`.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The session user's home directory, or `/` when no user is known.
    pub fn home(&self) -> CanonicalPath {
        home_of(self.user.as_deref())
    }
}

/// Home directory for a user name: `/home/{user}`, or `/` for `None`
/// (and for an empty name).
pub fn home_of(user: Option<&str>) -> CanonicalPath {
    match user {
        Some(u) if !u.is_empty() => CanonicalPath::normalize(&format!("/home/{u}")),
        _ => CanonicalPath::root(),
    }
}

/// How navigation treats links.
///
/// - **Logical**: the working directory keeps the path the user typed,
///   links included.
/// - **Physical**: the working directory always holds the fully
///   dereferenced path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressingMode {
    #[default]
    Logical,
    Physical,
}

impl AddressingMode {
    pub fn is_physical(self) -> bool {
        self == AddressingMode::Physical
    }
}

impl fmt::Display for AddressingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressingMode::Logical => f.write_str("logical"),
            AddressingMode::Physical => f.write_str("physical"),
        }
    }
}

impl FromStr for AddressingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logical" | "L" => Ok(AddressingMode::Logical),
            "physical" | "P" => Ok(AddressingMode::Physical),
            other => Err(format!("unknown addressing mode: {other}")),
        }
    }
}
