//! Cryptographic primitives for ProvChain

use crate::error::ChainError;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE},
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    /// Creates a KeyPair from an existing SecretKey.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    /// Creates a KeyPair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, ChainError> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|e| {
            if bytes.len() != SECRET_KEY_SIZE {
                ChainError::CryptoError(format!(
                    "Secret key must be {} bytes, got {}",
                    SECRET_KEY_SIZE,
                    bytes.len()
                ))
            } else {
                ChainError::CryptoError(format!("Invalid secret key bytes: {}", e))
            }
        })?;

        Ok(Self::from_secret_key(secret_key))
    }

    /// Returns the KeyPair's public key as a compressed byte array.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.public_key.serialize()
    }

    /// Signs a message (which is first hashed using SHA-256) and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE], ChainError> {
        let message = message_digest(message)?;
        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }
}

fn message_digest(message: &[u8]) -> Result<Message, ChainError> {
    let digest = Sha256::digest(message);
    Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))
}

/// Parses a compressed (33-byte) or uncompressed (65-byte) public key.
pub fn public_key_from_bytes(bytes: &[u8]) -> Result<PublicKey, ChainError> {
    PublicKey::from_slice(bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid public key: {}", e)))
}

/// Verifies an ECDSA signature over `message` with the given public key.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), ChainError> {
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::CryptoError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }

    let message = message_digest(message)?;

    let signature = Signature::from_compact(signature_bytes)
        .map_err(|e| ChainError::CryptoError(format!("Invalid signature: {}", e)))?;

    SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, public_key)
        .map_err(|_| ChainError::CryptoError("Signature verification failed".to_string()))
}

/// Fail-closed form of [`verify_signature`]: any malformed input is `false`.
pub fn verify(public_key: &PublicKey, message: &[u8], signature_bytes: &[u8]) -> bool {
    verify_signature(public_key, message, signature_bytes).is_ok()
}

/// Supplies the signing keypair for a named participant, creating one the
/// first time an identity is seen.
pub trait KeyProvider {
    fn load_or_create(&mut self, identity: &str) -> Result<KeyPair, ChainError>;
}

/// Keys held only for the lifetime of the store.
#[derive(Debug, Default)]
pub struct InMemoryKeyStore {
    keys: HashMap<String, KeyPair>,
}

impl InMemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyProvider for InMemoryKeyStore {
    fn load_or_create(&mut self, identity: &str) -> Result<KeyPair, ChainError> {
        Ok(self
            .keys
            .entry(identity.to_string())
            .or_insert_with(KeyPair::generate)
            .clone())
    }
}

/// One hex-encoded secret key file per identity, `<identity>_private.key`,
/// inside a directory.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn key_path(&self, identity: &str) -> Result<PathBuf, ChainError> {
        let valid = !identity.is_empty()
            && identity
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            && identity != "."
            && identity != "..";
        if !valid {
            return Err(ChainError::InvalidIdentity(identity.to_string()));
        }
        Ok(self.dir.join(format!("{}_private.key", identity)))
    }
}

impl KeyProvider for FileKeyStore {
    fn load_or_create(&mut self, identity: &str) -> Result<KeyPair, ChainError> {
        let path = self.key_path(identity)?;

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let bytes = hex::decode(contents.trim()).map_err(|e| {
                ChainError::CryptoError(format!("Malformed key file {}: {}", path.display(), e))
            })?;
            debug!("Loaded key for '{}' from {}", identity, path.display());
            return KeyPair::from_secret_bytes(&bytes);
        }

        fs::create_dir_all(&self.dir)?;
        let keypair = KeyPair::generate();
        write_secret_file(&path, &hex::encode(keypair.secret_key.secret_bytes()))?;
        info!("Generated new key for '{}' at {}", identity, path.display());
        Ok(keypair)
    }
}

/// Create a key file readable by its owner only.
fn write_secret_file(path: &Path, contents: &str) -> Result<(), ChainError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    Ok(())
}
