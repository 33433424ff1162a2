//! Ed25519 request verification: the signature covers `timestamp || raw_body`.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error, PartialEq)]
pub enum VerifyError {
    #[error("missing signature headers")]
    MissingHeaders,

    #[error("malformed public key: {0}")]
    BadPublicKey(String),

    #[error("malformed signature")]
    MalformedSignature,

    #[error("bad signature")]
    BadSignature,
}

#[derive(Debug, Clone)]
pub struct InteractionVerifier {
    key: VerifyingKey,
}

impl InteractionVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, VerifyError> {
        let raw = hex::decode(public_key_hex.trim()).map_err(|e| VerifyError::BadPublicKey(e.to_string()))?;
        let bytes: [u8; 32] = raw
            .as_slice()
            .try_into()
            .map_err(|_| VerifyError::BadPublicKey(format!("expected 32 bytes, got {}", raw.len())))?;
        let key = VerifyingKey::from_bytes(&bytes).map_err(|e| VerifyError::BadPublicKey(e.to_string()))?;
        Ok(Self { key })
    }

    pub fn from_key(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// `signature_hex` and `timestamp` come straight from the request headers.
    pub fn verify(
        &self,
        signature_hex: Option<&str>,
        timestamp: Option<&str>,
        body: &[u8],
    ) -> Result<(), VerifyError> {
        let (Some(sig_hex), Some(ts)) = (signature_hex, timestamp) else {
            return Err(VerifyError::MissingHeaders);
        };

        let sig_bytes: [u8; 64] = hex::decode(sig_hex.trim())
            .ok()
            .and_then(|b| b.try_into().ok())
            .ok_or(VerifyError::MalformedSignature)?;
        let signature = Signature::from_bytes(&sig_bytes);

        let mut message = Vec::with_capacity(ts.len() + body.len());
        message.extend_from_slice(ts.as_bytes());
        message.extend_from_slice(body);

        self.key
            .verify(&message, &signature)
            .map_err(|_| VerifyError::BadSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};

    fn keypair() -> (SigningKey, InteractionVerifier) {
        let signing = SigningKey::from_bytes(&[7u8; 32]);
        let public_hex = hex::encode(signing.verifying_key().to_bytes());
        (signing, InteractionVerifier::from_hex(&public_hex).unwrap())
    }

    fn sign(key: &SigningKey, ts: &str, body: &[u8]) -> String {
        let mut msg = ts.as_bytes().to_vec();
        msg.extend_from_slice(body);
        hex::encode(key.sign(&msg).to_bytes())
    }

    #[test]
    fn valid_signature_passes() {
        let (key, verifier) = keypair();
        let body = br#"{"type":1}"#;
        let sig = sign(&key, "1700000000", body);
        assert_eq!(verifier.verify(Some(&sig), Some("1700000000"), body), Ok(()));
    }

    #[test]
    fn any_mutated_byte_fails() {
        let (key, verifier) = keypair();
        let body = br#"{"type":2,"data":{"name":"futures"}}"#.to_vec();
        let ts = "1700000000";
        let sig = sign(&key, ts, &body);

        for i in 0..body.len() {
            let mut tampered = body.clone();
            tampered[i] ^= 0x01;
            assert_eq!(
                verifier.verify(Some(&sig), Some(ts), &tampered),
                Err(VerifyError::BadSignature),
                "body byte {i}"
            );
        }
        assert_eq!(verifier.verify(Some(&sig), Some("1700000001"), &body), Err(VerifyError::BadSignature));
    }

    #[test]
    fn missing_or_malformed_inputs() {
        let (_, verifier) = keypair();
        assert_eq!(verifier.verify(None, Some("1"), b"{}"), Err(VerifyError::MissingHeaders));
        assert_eq!(verifier.verify(Some("00"), None, b"{}"), Err(VerifyError::MissingHeaders));
        assert_eq!(verifier.verify(Some("zz"), Some("1"), b"{}"), Err(VerifyError::MalformedSignature));
        assert_eq!(verifier.verify(Some("abcd"), Some("1"), b"{}"), Err(VerifyError::MalformedSignature));
        assert!(matches!(InteractionVerifier::from_hex("xyz"), Err(VerifyError::BadPublicKey(_))));
        assert!(matches!(InteractionVerifier::from_hex("abcd"), Err(VerifyError::BadPublicKey(_))));
    }
}
