//! The opaque signing capability consumed by the execution engine.

use crate::ed25519::{PrivateKey, PublicKey, Signature};

/// Anything that can authorize request bytes.
///
/// The engine never sees key material: it hands frozen body bytes to a
/// signer and stores whatever signature comes back.
pub trait Signer: Send + Sync {
    /// Sign the given bytes.
    fn sign(&self, bytes: &[u8]) -> Signature;

    /// Public key the produced signatures verify against.
    fn public_key(&self) -> PublicKey;
}

impl Signer for PrivateKey {
    fn sign(&self, bytes: &[u8]) -> Signature {
        PrivateKey::sign(self, bytes)
    }

    fn public_key(&self) -> PublicKey {
        PrivateKey::public_key(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_is_a_signer() {
        let key = PrivateKey::generate(&mut rand::thread_rng());
        let signer: &dyn Signer = &key;
        let sig = signer.sign(b"payload");
        assert!(signer.public_key().verify(b"payload", &sig));
    }
}
