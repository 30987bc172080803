//! Account identities of parties and applications.

use core::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bincode::{Decode, Encode};
use sha2::{Digest, Sha512_256};

use crate::error::IdentityError;

/// Domain separator for application account derivation.
const APP_ID_PREFIX: &[u8] = b"appID";

/// A 32-byte account identity.
///
/// Parsed from `0x`-prefixed or bare 64-char hex, base58, or padded base64.
/// Always displayed as base58.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode)]
pub struct Address(pub [u8; 32]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Account controlled by application `app_id`:
    /// `SHA-512/256("appID" || app_id as big-endian u64)`.
    pub fn for_application(app_id: u64) -> Self {
        let mut hasher = Sha512_256::new();
        hasher.update(APP_ID_PREFIX);
        hasher.update(app_id.to_be_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Build from an arbitrary byte slice, checking its length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, IdentityError> {
        let raw: [u8; 32] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidLength(bytes.len()))?;
        Ok(Self(raw))
    }
}

impl From<[u8; 32]> for Address {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }

        let bytes = if let Some(h) = s.strip_prefix("0x") {
            hex::decode(h)?
        } else if s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            hex::decode(s)?
        } else if s.contains(['=', '+', '/']) {
            STANDARD.decode(s)?
        } else {
            bs58::decode(s).into_vec()?
        };

        Self::from_slice(&bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}
