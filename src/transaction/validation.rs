/// Signature checks kept apart from the type definitions
use crate::crypto;
use crate::transaction::types::Transaction;
use secp256k1::PublicKey;
use tracing::debug;

impl Transaction {
    /// `true` only when a signature is present and matches the current
    /// fields under `public_key`. Missing, malformed or forged signatures
    /// are all `false`.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        let Some(signature) = self.signature.as_deref() else {
            return false;
        };
        match self.signable_message() {
            Ok(message) => crypto::verify(public_key, &message, signature),
            Err(e) => {
                debug!("Could not encode transaction from {}: {}", self.sender, e);
                false
            }
        }
    }
}
