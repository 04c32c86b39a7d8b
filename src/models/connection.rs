//! Connection-related data models.
//!
//! This module defines the connection variant and transaction metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Connection variant, selecting the protocol segment of the connection string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionType {
    /// Pure TCP/IP wire protocol (no segment)
    #[default]
    Tcp,
    Local,
    Native,
    Embedded,
}

impl ConnectionType {
    /// Parse a connection type name, case-insensitive and trimmed.
    ///
    /// Unknown names fall back to [`ConnectionType::Tcp`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Self::Local,
            "native" => Self::Native,
            "embedded" => Self::Embedded,
            _ => Self::Tcp,
        }
    }

    /// clap value parser; never fails.
    pub fn parse_lenient(name: &str) -> Result<Self, String> {
        Ok(Self::from_name(name))
    }

    /// Connection string segment for this variant, if any.
    pub fn segment(&self) -> Option<&'static str> {
        match self {
            Self::Tcp => None,
            Self::Local => Some("local"),
            Self::Native => Some("native"),
            Self::Embedded => Some("embedded"),
        }
    }

    pub fn display_name(&self) -> &'static str {
        self.segment().unwrap_or("tcp")
    }
}

impl std::fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Metadata about a live transaction handle (for listing without consuming).
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub transaction_id: String,
    /// True for the reserved default identifier
    pub is_default: bool,
    pub auto_commit: bool,
    pub started_at: DateTime<Utc>,
    /// Seconds since the handle was opened
    pub duration_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(ConnectionType::from_name("local"), ConnectionType::Local);
        assert_eq!(ConnectionType::from_name(" NATIVE "), ConnectionType::Native);
        assert_eq!(ConnectionType::from_name("Embedded"), ConnectionType::Embedded);
        assert_eq!(ConnectionType::from_name("tcp"), ConnectionType::Tcp);
        assert_eq!(ConnectionType::from_name(""), ConnectionType::Tcp);
        assert_eq!(ConnectionType::from_name("xnet"), ConnectionType::Tcp);
    }

    #[test]
    fn test_segment() {
        assert_eq!(ConnectionType::Tcp.segment(), None);
        assert_eq!(ConnectionType::Embedded.segment(), Some("embedded"));
        assert_eq!(ConnectionType::Tcp.to_string(), "tcp");
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ConnectionType::Native).unwrap();
        assert_eq!(json, "\"native\"");
    }
}
