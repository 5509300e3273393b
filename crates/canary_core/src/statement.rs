//! Canary statements, raw documents, and the chain tip.

use crate::error::CoreResult;
use crate::hash::Hash;
use crate::time::Timestamp;
use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The verified content of one canary
///
/// A statement only exists in this form after its signature has been
/// checked against the trusted key; nothing downstream re-verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedStatement {
    /// Protocol version the statement was written for
    pub version: ProtocolVersion,
    /// The promise expires at this instant
    pub deadline: Timestamp,
    /// Hash of the raw predecessor document, absent for the first canary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Hash>,
    /// Free text from the operator
    #[serde(default)]
    pub message: String,
}

impl SignedStatement {
    /// Create a statement at the current protocol version
    #[must_use]
    pub fn new(deadline: Timestamp, previous: Option<Hash>) -> Self {
        Self {
            version: ProtocolVersion::CURRENT,
            deadline,
            previous,
            message: String::new(),
        }
    }

    /// Attach operator text
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Decode from JSON bytes
    ///
    /// # Errors
    ///
    /// Returns error if the bytes are not a valid statement
    pub fn from_json(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encode to JSON
    ///
    /// # Errors
    ///
    /// Returns error if the deadline cannot be rendered
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// The exact encoded text a statement was derived from
///
/// This is what gets hashed for linkage, persisted, and republished. It is
/// never re-encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawDocument(String);

impl RawDocument {
    /// Wrap document text as received
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the document text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the document bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Linkage hash over the exact bytes
    #[must_use]
    pub fn hash(&self) -> Hash {
        Hash::compute(self.as_bytes())
    }

    /// Take the document text
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for RawDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawDocument")
            .field(&format_args!("{} bytes, {}", self.0.len(), self.hash()))
            .finish()
    }
}

impl From<String> for RawDocument {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for RawDocument {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// The most recently accepted canary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    /// Raw document as published
    pub document: RawDocument,
    /// Statement decoded from `document`
    pub statement: SignedStatement,
}

impl ChainTip {
    /// Create a new tip
    #[must_use]
    pub fn new(document: RawDocument, statement: SignedStatement) -> Self {
        Self {
            document,
            statement,
        }
    }

    /// Deadline of the tip statement
    #[must_use]
    pub fn deadline(&self) -> Timestamp {
        self.statement.deadline
    }

    /// Hash a successor must name as `previous`
    #[must_use]
    pub fn hash(&self) -> Hash {
        self.document.hash()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_json_roundtrip() {
        let prev = Hash::compute(b"previous");
        let stmt = SignedStatement::new(Timestamp::new(1_900_000_000, 0), Some(prev))
            .with_message("all clear");
        let json = stmt.to_json().unwrap();
        assert!(json.contains("\"version\":\"v1\""));
        assert_eq!(SignedStatement::from_json(json.as_bytes()).unwrap(), stmt);
    }

    #[test]
    fn test_statement_without_previous() {
        let json = br#"{"version":"v1","deadline":"2030-01-01T00:00:00Z"}"#;
        let stmt = SignedStatement::from_json(json).unwrap();
        assert!(stmt.previous.is_none());
        assert!(stmt.message.is_empty());
        assert!(!stmt.to_json().unwrap().contains("previous"));
    }

    #[test]
    fn test_statement_rejects_bad_fields() {
        let bad_hash = br#"{"version":"v1","deadline":"2030-01-01T00:00:00Z","previous":"xyz"}"#;
        assert!(SignedStatement::from_json(bad_hash).is_err());

        let bad_deadline = br#"{"version":"v1","deadline":"soon"}"#;
        assert!(SignedStatement::from_json(bad_deadline).is_err());
    }

    #[test]
    fn test_raw_document_hash_is_over_exact_bytes() {
        let a = RawDocument::new("{\"a\":1}");
        let b = RawDocument::new("{ \"a\": 1 }");
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash(), Hash::compute(b"{\"a\":1}"));
    }

    #[test]
    fn test_tip_accessors() {
        let doc = RawDocument::new("doc");
        let stmt = SignedStatement::new(Timestamp::new(10, 0), None);
        let tip = ChainTip::new(doc.clone(), stmt);
        assert_eq!(tip.deadline(), Timestamp::new(10, 0));
        assert_eq!(tip.hash(), doc.hash());
    }
}
