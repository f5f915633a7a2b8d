/// Transaction types for ProvChain
use crate::crypto::KeyPair;
use crate::encoding::{require_finite, to_canonical_json};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch with sub-second precision.
pub fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// A signed statement that a product moved from `sender` to `receiver`.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub product_id: String,
    pub sender: String,
    pub receiver: String,
    pub location: String,
    pub description: String,
    pub timestamp: f64,
    pub signature: Option<Vec<u8>>,
}

/// Frozen copy of a [`Transaction`] as stored inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub product_id: String,
    pub sender: String,
    pub receiver: String,
    pub location: String,
    pub description: String,
    pub timestamp: f64,
    #[serde(with = "hex_signature")]
    pub signature: Option<Vec<u8>>,
}

/// The fields covered by a signature. The signature itself is excluded.
#[derive(Serialize)]
struct SignablePayload<'a> {
    product_id: &'a str,
    sender: &'a str,
    receiver: &'a str,
    location: &'a str,
    description: &'a str,
    timestamp: f64,
}

impl Transaction {
    pub fn new(
        product_id: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(product_id, sender, receiver, location, description, now_seconds())
    }

    pub fn with_timestamp(
        product_id: impl Into<String>,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
        timestamp: f64,
    ) -> Self {
        Transaction {
            product_id: product_id.into(),
            sender: sender.into(),
            receiver: receiver.into(),
            location: location.into(),
            description: description.into(),
            timestamp,
            signature: None,
        }
    }

    fn payload(&self) -> SignablePayload<'_> {
        SignablePayload {
            product_id: &self.product_id,
            sender: &self.sender,
            receiver: &self.receiver,
            location: &self.location,
            description: &self.description,
            timestamp: self.timestamp,
        }
    }

    /// Canonical bytes that the sender signs. Fails for a non-finite
    /// timestamp, so such a transaction can be neither signed nor verified.
    pub fn signable_message(&self) -> Result<Vec<u8>, ChainError> {
        require_finite(self.timestamp, "timestamp")?;
        to_canonical_json(&self.payload())
    }

    /// Sign with the sender's key, replacing any earlier signature.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<(), ChainError> {
        let message = self.signable_message()?;
        let signature = keypair.sign(&message)?;
        self.signature = Some(signature.to_vec());
        Ok(())
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Snapshot the transaction for inclusion in a block.
    pub fn to_record(&self) -> TransactionRecord {
        TransactionRecord {
            product_id: self.product_id.clone(),
            sender: self.sender.clone(),
            receiver: self.receiver.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
            timestamp: self.timestamp,
            signature: self.signature.clone(),
        }
    }
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        Transaction {
            product_id: record.product_id,
            sender: record.sender,
            receiver: record.receiver,
            location: record.location,
            description: record.description,
            timestamp: record.timestamp,
            signature: record.signature,
        }
    }
}

impl From<&TransactionRecord> for Transaction {
    fn from(record: &TransactionRecord) -> Self {
        Transaction::from(record.clone())
    }
}

impl TransactionRecord {
    fn payload(&self) -> SignablePayload<'_> {
        SignablePayload {
            product_id: &self.product_id,
            sender: &self.sender,
            receiver: &self.receiver,
            location: &self.location,
            description: &self.description,
            timestamp: self.timestamp,
        }
    }

    /// Same bytes as [`Transaction::signable_message`] for the transaction
    /// this record was taken from.
    pub fn signable_message(&self) -> Result<Vec<u8>, ChainError> {
        require_finite(self.timestamp, "timestamp")?;
        to_canonical_json(&self.payload())
    }
}

/// Signatures travel as lowercase hex, or `null` when absent.
mod hex_signature {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(signature: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match signature {
            Some(bytes) => serializer.serialize_str(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| hex::decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
