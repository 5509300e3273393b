//! Proof envelope encoding and verification.
//!
//! ```text
//! {
//!   "statement": {"version":"v1","deadline":"...","previous":"..."},
//!   "signature": "<hex ed25519 over the statement bytes>"
//! }
//! ```

use crate::key::{CanaryKey, PublicKey};
use canary_core::{CoreError, RawDocument, SignedStatement};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

#[derive(Serialize, Deserialize)]
struct Envelope<'a> {
    #[serde(borrow)]
    statement: &'a RawValue,
    signature: String,
}

/// Errors opening or sealing a proof
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProofError {
    /// Not a proof envelope
    #[error("Malformed proof: {0}")]
    Malformed(String),
    /// Signature is not valid hex
    #[error("Malformed signature encoding")]
    InvalidSignatureEncoding,
    /// Signature does not verify against the trusted key
    #[error("Proof signature does not match canary key")]
    BadSignature,
    /// Statement body could not be decoded
    #[error("Invalid canary statement: {0}")]
    InvalidStatement(#[from] CoreError),
}

/// Sign a statement and wrap it into a proof document
///
/// # Errors
///
/// Returns error if the statement cannot be encoded
pub fn seal_proof(key: &CanaryKey, statement: &SignedStatement) -> Result<RawDocument, ProofError> {
    let body = statement.to_json()?;
    let signature = hex::encode(key.sign(body.as_bytes()));
    let body = RawValue::from_string(body).map_err(|e| ProofError::Malformed(e.to_string()))?;

    let envelope = Envelope {
        statement: &body,
        signature,
    };
    let mut text =
        serde_json::to_string_pretty(&envelope).map_err(|e| ProofError::Malformed(e.to_string()))?;
    text.push('\n');
    Ok(RawDocument::new(text))
}

/// Decode a proof document and verify its signature
///
/// The signature is checked over the statement bytes exactly as they
/// appear in `document`.
///
/// # Errors
///
/// Returns error if the document is malformed, the signature does not
/// verify, or the statement is invalid
pub fn open_proof(key: &PublicKey, document: &RawDocument) -> Result<SignedStatement, ProofError> {
    let envelope: Envelope<'_> = serde_json::from_str(document.as_str())
        .map_err(|e| ProofError::Malformed(e.to_string()))?;

    let signature =
        hex::decode(&envelope.signature).map_err(|_| ProofError::InvalidSignatureEncoding)?;
    let body = envelope.statement.get();
    if !key.verify(body.as_bytes(), &signature) {
        return Err(ProofError::BadSignature);
    }

    Ok(SignedStatement::from_json(body.as_bytes())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_core::{Hash, Timestamp};

    fn statement() -> SignedStatement {
        SignedStatement::new(Timestamp::new(1_900_000_000, 0), Some(Hash::compute(b"prev")))
            .with_message("No warrants have been served.")
    }

    #[test]
    fn test_seal_then_open() {
        let key = CanaryKey::generate();
        let doc = seal_proof(&key, &statement()).unwrap();
        assert!(doc.as_str().ends_with('\n'));
        assert_eq!(open_proof(&key.public_key(), &doc).unwrap(), statement());
    }

    #[test]
    fn test_open_with_wrong_key() {
        let doc = seal_proof(&CanaryKey::generate(), &statement()).unwrap();
        let other = CanaryKey::generate().public_key();
        assert_eq!(open_proof(&other, &doc), Err(ProofError::BadSignature));
    }

    #[test]
    fn test_tampered_statement_fails() {
        let key = CanaryKey::generate();
        let doc = seal_proof(&key, &statement()).unwrap();
        let tampered = RawDocument::new(doc.as_str().replace("2030", "2031"));
        assert_eq!(open_proof(&key.public_key(), &tampered), Err(ProofError::BadSignature));
    }

    #[test]
    fn test_malformed_documents() {
        let key = CanaryKey::generate().public_key();
        assert!(matches!(
            open_proof(&key, &RawDocument::new("hello")),
            Err(ProofError::Malformed(_))
        ));
        assert!(matches!(
            open_proof(&key, &RawDocument::new(r#"{"statement":{},"signature":"zz"}"#)),
            Err(ProofError::InvalidSignatureEncoding)
        ));
    }

    #[test]
    fn test_signed_garbage_statement_is_invalid() {
        let key = CanaryKey::generate();
        let body = r#"{"version":"v1"}"#;
        let doc = RawDocument::new(format!(
            r#"{{"statement":{},"signature":"{}"}}"#,
            body,
            hex::encode(key.sign(body.as_bytes()))
        ));
        assert!(matches!(
            open_proof(&key.public_key(), &doc),
            Err(ProofError::InvalidStatement(_))
        ));
    }

    #[test]
    fn test_signed_non_canonical_version_is_invalid() {
        let key = CanaryKey::generate();
        for version in ["v01", "v+1"] {
            let body = format!(r#"{{"version":"{version}","deadline":"2030-01-01T00:00:00Z"}}"#);
            let doc = RawDocument::new(format!(
                r#"{{"statement":{},"signature":"{}"}}"#,
                body,
                hex::encode(key.sign(body.as_bytes()))
            ));
            assert!(matches!(
                open_proof(&key.public_key(), &doc),
                Err(ProofError::InvalidStatement(_))
            ));
        }
    }

    #[test]
    fn test_whitespace_inside_statement_is_signed_verbatim() {
        let key = CanaryKey::generate();
        let body = "{ \"version\": \"v1\", \"deadline\": \"2030-01-01T00:00:00Z\" }";
        let doc = RawDocument::new(format!(
            "{{\"statement\": {}, \"signature\": \"{}\"}}",
            body,
            hex::encode(key.sign(body.as_bytes()))
        ));
        let stmt = open_proof(&key.public_key(), &doc).unwrap();
        assert_eq!(stmt.deadline, Timestamp::parse_rfc3339("2030-01-01T00:00:00Z").unwrap());
    }
}
