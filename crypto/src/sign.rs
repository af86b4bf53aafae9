//! Ed25519 message signing and verification.

use guardian_types::{PrivateKey, PublicKey, Signature};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

/// Sign a message with a private key.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    Signature(signing_key.sign(message).to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Uses strict verification, which also rejects non-canonical signatures and
/// small-order keys.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let msg = b"round 1 data hash";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = keypair_from_seed(&[3u8; 32]);
        let sig = sign_message(b"correct", &kp.private);
        assert!(!verify_signature(b"wrong", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"msg", &kp1.private);
        assert!(!verify_signature(b"msg", &sig, &kp2.public));
    }

    #[test]
    fn zeroed_signature_fails() {
        let kp = keypair_from_seed(&[4u8; 32]);
        assert!(!verify_signature(b"msg", &Signature([0u8; 64]), &kp.public));
    }

    #[test]
    fn invalid_public_key_fails() {
        let kp = keypair_from_seed(&[5u8; 32]);
        let sig = sign_message(b"msg", &kp.private);
        let mut bad = [0xFF; 32];
        bad[31] = 0x7F;
        assert!(!verify_signature(b"msg", &sig, &PublicKey(bad)));
    }
}
