//! Signer trait and implementations.
//!
//! A `Signer` knows which account it signs for and hands out a [`SigningKey`]
//! that bundles the public key with the signing capability. Signing goes
//! through an async backend so keys held outside the process (KMS, hardware)
//! can implement the same trait.
//!
//! # Example
//!
//! ```rust,no_run
//! use cess_kit::{InMemorySigner, Signer};
//!
//! # async fn example() -> Result<(), cess_kit::Error> {
//! let signer = InMemorySigner::from_mnemonic(
//!     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
//! )?;
//! let signature = signer.key().sign(b"payload").await?;
//! assert!(signer.public_key().verify(b"payload", &signature));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::SignerError;
use crate::types::{PublicKey, SecretKey, Signature};

/// Boxed future returned by signing backends.
pub type SignFuture<'a> = Pin<Box<dyn Future<Output = Result<Signature, SignerError>> + Send + 'a>>;

// ============================================================================
// Signer Trait
// ============================================================================

/// Trait for signing extrinsics.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use cess_kit::{PublicKey, SecretKey, Signer, SigningKey};
///
/// struct MySigner {
///     secret_key: SecretKey,
///     public_key: PublicKey,
/// }
///
/// impl Signer for MySigner {
///     fn public_key(&self) -> &PublicKey {
///         &self.public_key
///     }
///
///     fn key(&self) -> SigningKey {
///         SigningKey::new(self.secret_key.clone())
///     }
/// }
/// ```
pub trait Signer: Send + Sync {
    /// The account this signer signs for.
    fn public_key(&self) -> &PublicKey;

    /// Get a key for signing.
    fn key(&self) -> SigningKey;
}

impl Signer for Arc<dyn Signer> {
    fn public_key(&self) -> &PublicKey {
        (**self).public_key()
    }

    fn key(&self) -> SigningKey {
        (**self).key()
    }
}

// ============================================================================
// SigningKey
// ============================================================================

/// A key that can sign messages.
pub struct SigningKey {
    public_key: PublicKey,
    backend: Arc<dyn SigningBackend>,
}

impl SigningKey {
    /// Create a signing key backed by an in-memory secret key.
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self {
            public_key,
            backend: Arc::new(SecretKeyBackend { secret_key }),
        }
    }

    /// Create a signing key backed by a custom backend.
    pub fn with_backend(public_key: PublicKey, backend: Arc<dyn SigningBackend>) -> Self {
        Self {
            public_key,
            backend,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Sign a message.
    pub async fn sign(&self, message: &[u8]) -> Result<Signature, SignerError> {
        self.backend.sign(message).await
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A source of signatures for one key.
pub trait SigningBackend: Send + Sync {
    fn sign<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a>;
}

struct SecretKeyBackend {
    secret_key: SecretKey,
}

impl SigningBackend for SecretKeyBackend {
    fn sign<'a>(&'a self, message: &'a [u8]) -> SignFuture<'a> {
        let sig = self.secret_key.sign(message);
        Box::pin(async move { Ok(sig) })
    }
}

// ============================================================================
// InMemorySigner
// ============================================================================

/// A signer with a single key held in memory.
#[derive(Clone)]
pub struct InMemorySigner {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl InMemorySigner {
    /// Create a signer from a `0x`-prefixed hex secret seed.
    pub fn new(secret_key: impl AsRef<str>) -> Result<Self, SignerError> {
        let secret_key: SecretKey = secret_key.as_ref().parse()?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Create a signer from a `SecretKey` directly.
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a signer from a BIP-39 mnemonic.
    pub fn from_mnemonic(phrase: impl AsRef<str>) -> Result<Self, SignerError> {
        SecretKey::from_mnemonic(phrase.as_ref()).map(Self::from_secret_key)
    }
}

impl std::fmt::Debug for InMemorySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySigner")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl Signer for InMemorySigner {
    fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    fn key(&self) -> SigningKey {
        SigningKey::new(self.secret_key.clone())
    }
}

// ============================================================================
// SigningIdentity
// ============================================================================

/// The account an SDK instance signs for. Immutable after construction.
#[derive(Clone)]
pub struct SigningIdentity {
    signer: Arc<dyn Signer>,
    public_key: PublicKey,
    address: String,
}

impl SigningIdentity {
    pub fn new(signer: Arc<dyn Signer>, ss58_prefix: u16) -> Self {
        let public_key = *signer.public_key();
        let address = public_key.to_ss58(ss58_prefix);
        Self {
            signer,
            public_key,
            address,
        }
    }

    pub fn signer(&self) -> &Arc<dyn Signer> {
        &self.signer
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The SS58 address of the account.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl std::fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("address", &self.address)
            .finish()
    }
}
