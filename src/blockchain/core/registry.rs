use secp256k1::PublicKey;
use std::collections::HashMap;
use tracing::info;

/// Identity name to registered public key. The last registration for a
/// name wins.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<String, PublicKey>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, identity: impl Into<String>, public_key: PublicKey) {
        let identity = identity.into();
        if let Some(previous) = self.participants.insert(identity.clone(), public_key) {
            if previous != public_key {
                info!("Participant '{}' re-registered with a new key.", identity);
                return;
            }
        }
        info!("Participant '{}' registered.", identity);
    }

    pub fn get(&self, identity: &str) -> Option<&PublicKey> {
        self.participants.get(identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.participants.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PublicKey)> {
        self.participants.iter().map(|(k, v)| (k.as_str(), v))
    }
}
