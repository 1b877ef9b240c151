//! Account and wallet identity derivation
//!
//! An account is an ed25519 keypair derived deterministically from a
//! 32-byte secret seed. The wallet wraps an account with the identity
//! string the tunnel entry presents to relays.

use crate::error::{AppError, Result};
use ed25519_dalek::{SigningKey, VerifyingKey};

/// Required seed length in bytes
pub const SEED_LEN: usize = 32;

/// Keypair derived from a secret seed
#[derive(Clone)]
pub struct Account {
    signing_key: SigningKey,
}

impl Account {
    /// Derive an account from raw seed bytes.
    ///
    /// The seed must be exactly [`SEED_LEN`] bytes.
    pub fn from_seed(seed: &[u8]) -> Result<Self> {
        let bytes: [u8; SEED_LEN] = seed.try_into().map_err(|_| {
            AppError::account(format!(
                "seed must be {} bytes, got {}",
                SEED_LEN,
                seed.len()
            ))
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Public half of the keypair
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Hex-encoded public key
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key().as_bytes())
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the secret half
        f.debug_struct("Account")
            .field("public_key", &self.public_key_hex())
            .finish()
    }
}

/// Wallet identity backed by an account
#[derive(Debug, Clone)]
pub struct Wallet {
    account: Account,
    address: String,
}

impl Wallet {
    /// Derive a wallet from an account
    pub fn from_account(account: Account) -> Result<Self> {
        let address = account.public_key_hex();
        if address.is_empty() {
            return Err(AppError::wallet("derived an empty wallet address"));
        }
        Ok(Self { account, address })
    }

    /// Identity string presented to relays
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn account(&self) -> &Account {
        &self.account
    }
}
