//! Verification of texture-property signatures.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::{Digest, Sha1};
use tracing::debug;

use crate::error::{Error, InvalidInputError};

/// The identity service's texture-signing public key.
///
/// Loaded once from X.509 SubjectPublicKeyInfo DER bytes and treated as
/// process-lifetime immutable. Signatures are SHA-1 with RSA PKCS#1 v1.5
/// over the raw property value bytes.
#[derive(Debug, Clone)]
pub struct ProfileSignatureKey {
    key: RsaPublicKey,
}

impl ProfileSignatureKey {
    /// Load the key from DER bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the bytes are not a valid RSA
    /// public key.
    pub fn from_der(der: &[u8]) -> Result<Self, Error> {
        let key = RsaPublicKey::from_public_key_der(der).map_err(|e| {
            InvalidInputError::PublicKey {
                reason: e.to_string(),
            }
        })?;
        Ok(Self { key })
    }

    /// Verify a base64 signature over a property value.
    ///
    /// Returns `false` for signatures that fail to decode as well as for
    /// ones that decode but do not verify.
    pub fn verify(&self, value: &str, signature_b64: &str) -> bool {
        let Ok(signature) = BASE64.decode(signature_b64) else {
            debug!("signature is not valid base64");
            return false;
        };

        let digest = Sha1::digest(value.as_bytes());
        self.key
            .verify(Pkcs1v15Sign::new::<Sha1>(), &digest, &signature)
            .is_ok()
    }
}
