//! SS58 account addresses.
//!
//! Layout: `prefix (1 or 2 bytes) ++ public key ++ checksum (2 bytes)`,
//! base58 encoded. The checksum is the first two bytes of
//! `blake2b-512("SS58PRE" ++ prefix ++ public key)`.

use blake2::{Blake2b512, Digest};

use crate::error::ParseAddressError;

use super::PublicKey;

const CHECKSUM_PREFIX: &[u8] = b"SS58PRE";
const CHECKSUM_LEN: usize = 2;

/// Encode a public key as an SS58 address.
pub fn encode(public_key: &PublicKey, prefix: u16) -> String {
    let mut data = Vec::with_capacity(2 + 32 + CHECKSUM_LEN);
    if prefix < 64 {
        data.push(prefix as u8);
    } else {
        data.push(((prefix & 0x00fc) >> 2) as u8 | 0x40);
        data.push((prefix >> 8) as u8 | ((prefix & 0x0003) << 6) as u8);
    }
    data.extend_from_slice(public_key.as_bytes());
    let hash = checksum(&data);
    data.extend_from_slice(&hash[..CHECKSUM_LEN]);
    bs58::encode(data).into_string()
}

/// Decode an SS58 address into its network prefix and public key.
pub fn decode(s: &str) -> Result<(u16, PublicKey), ParseAddressError> {
    let data = bs58::decode(s)
        .into_vec()
        .map_err(|e| ParseAddressError::InvalidBase58(e.to_string()))?;
    let first = *data.first().ok_or(ParseAddressError::InvalidLength(0))?;

    let (prefix, prefix_len) = match first {
        0..=63 => (first as u16, 1),
        64..=127 => {
            let second = *data.get(1).ok_or(ParseAddressError::InvalidLength(1))?;
            let lower = ((first & 0x3f) << 2) | (second >> 6);
            let upper = second & 0x3f;
            (lower as u16 | ((upper as u16) << 8), 2)
        }
        _ => return Err(ParseAddressError::InvalidPrefix(first)),
    };

    if data.len() != prefix_len + 32 + CHECKSUM_LEN {
        return Err(ParseAddressError::InvalidLength(data.len()));
    }

    let body_len = prefix_len + 32;
    let hash = checksum(&data[..body_len]);
    if data[body_len..] != hash[..CHECKSUM_LEN] {
        return Err(ParseAddressError::InvalidChecksum);
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&data[prefix_len..body_len]);
    Ok((prefix, PublicKey::from_bytes(key)))
}

fn checksum(data: &[u8]) -> [u8; 64] {
    let mut hasher = Blake2b512::new();
    hasher.update(CHECKSUM_PREFIX);
    hasher.update(data);
    hasher.finalize().into()
}
