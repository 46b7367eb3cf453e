//! Key encodings.
//!
//! Numeric ids are big-endian so LMDB's lexicographic order matches numeric
//! order and a race's vote-total rows form a contiguous prefix.

use std::net::IpAddr;

use votatoon_types::{ClientId, RaceContestantId, RaceId};

use crate::LmdbError;

/// LMDB's default maximum key size is 511 bytes; leave room for the
/// length prefix and sequence suffix.
pub const MAX_CLIENT_ID_LEN: usize = 480;

pub const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";
pub const ACTIVE_RACE_KEY: &[u8] = b"active_race";
pub const CLIENT_VOTE_SEQ_KEY: &[u8] = b"client_vote_seq";

pub fn race_key(race: RaceId) -> [u8; 8] {
    race.to_be_bytes()
}

/// `race_id BE ++ race_contestant_id BE`.
pub fn vote_total_key(race: RaceId, row: RaceContestantId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&race.to_be_bytes());
    key[8..].copy_from_slice(&row.to_be_bytes());
    key
}

/// IPv4-mapped IPv6 addresses collapse onto their IPv4 form so one host
/// cannot hold two active votes by switching notation.
pub fn active_vote_key(ip: &IpAddr) -> Vec<u8> {
    ip.to_canonical().to_string().into_bytes()
}

/// `u16 BE length ++ client id bytes`.
pub fn client_prefix(client: &ClientId) -> Result<Vec<u8>, LmdbError> {
    let bytes = client.as_str().as_bytes();
    if bytes.len() > MAX_CLIENT_ID_LEN {
        return Err(LmdbError::Serialization(format!(
            "client id is {} bytes, limit is {}",
            bytes.len(),
            MAX_CLIENT_ID_LEN
        )));
    }
    let mut key = Vec::with_capacity(2 + bytes.len() + 8);
    key.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    key.extend_from_slice(bytes);
    Ok(key)
}

/// `client_prefix ++ sequence BE`.
pub fn client_vote_key(client: &ClientId, sequence: u64) -> Result<Vec<u8>, LmdbError> {
    let mut key = client_prefix(client)?;
    key.extend_from_slice(&sequence.to_be_bytes());
    Ok(key)
}

/// Smallest key strictly greater than every key starting with `prefix`,
/// or `None` if the prefix is all `0xff`.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}

pub fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Corruption(format!("{what} has unexpected byte length")))?;
    Ok(u64::from_be_bytes(arr))
}
