//! Read-only guard for report queries.
//!
//! Reporting must never change committed data. Every catalog statement is
//! parsed and classified before it reaches the database; anything that is not
//! a pure read is refused.

mod parser;

pub use parser::{classify_sql, SqlClassifier};

use std::fmt;

/// Whether a statement can change the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Pure reads (SELECT, plain EXPLAIN, SHOW).
    ReadOnly,
    /// Anything that writes data or schema, or could not be understood.
    Mutating,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "read-only"),
            Self::Mutating => write!(f, "mutating"),
        }
    }
}

/// The kind of SQL statement detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Explain,
    Show,
    Insert,
    Update,
    Delete,
    Merge,
    /// CREATE, ALTER, DROP, TRUNCATE and friends.
    Ddl,
    /// GRANT / REVOKE.
    Privilege,
    /// Several statements; carries the first mutating one (or the first one).
    Multiple(Box<StatementKind>),
    Unknown,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select => write!(f, "SELECT"),
            Self::Explain => write!(f, "EXPLAIN"),
            Self::Show => write!(f, "SHOW"),
            Self::Insert => write!(f, "INSERT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Delete => write!(f, "DELETE"),
            Self::Merge => write!(f, "MERGE"),
            Self::Ddl => write!(f, "DDL"),
            Self::Privilege => write!(f, "GRANT/REVOKE"),
            Self::Multiple(inner) => write!(f, "Multiple ({inner})"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of classifying a SQL string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub access: Access,
    pub kind: StatementKind,
    /// Why the statement was classified as mutating, when not obvious.
    pub note: Option<String>,
}

impl Classification {
    pub fn new(access: Access, kind: StatementKind) -> Self {
        Self {
            access,
            kind,
            note: None,
        }
    }

    pub fn with_note(access: Access, kind: StatementKind, note: impl Into<String>) -> Self {
        Self {
            access,
            kind,
            note: Some(note.into()),
        }
    }

    /// Returns true if the statement only reads.
    pub fn is_read_only(&self) -> bool {
        self.access == Access::ReadOnly
    }
}
