//! Types shared by all stakegraph crates: hex-encoded identifiers and the
//! numeric model for token and share quantities.

mod hex_string;
pub mod numeric;

pub use hex_string::HexString;
pub use numeric::{BigDecimal, BigInt};
use serde::{Deserialize, Serialize};

/// Ethereum addresses (indexers, delegators, operators, allocations and
/// contracts) are 20 bytes long.
pub type Address = HexString<[u8; 20]>;

/// Fixed-size 32-byte values: subgraph deployment IDs and PoIs.
pub type Bytes32 = HexString<[u8; 32]>;

/// A PoI (proof of indexing) is always 32 bytes.
pub type PoiBytes = Bytes32;

/// Note that block hashes have variable length, to easily deal with different
/// hash sizes across networks.
pub type BlockHash = HexString<Vec<u8>>;

/// The block an event was emitted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// The block number (or height).
    pub number: u64,
    pub hash: BlockHash,
    /// Unix timestamp, in seconds.
    pub timestamp: u64,
}

/// The position of an event in the canonical stream: block height first,
/// then log position within the block.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display(fmt = "#{}:{}", block_number, log_index)]
#[serde(rename_all = "camelCase")]
pub struct EventPointer {
    pub block_number: u64,
    pub log_index: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_pointers_order_by_block_then_log() {
        let a = EventPointer {
            block_number: 10,
            log_index: 7,
        };
        let b = EventPointer {
            block_number: 11,
            log_index: 0,
        };
        let c = EventPointer {
            block_number: 11,
            log_index: 1,
        };
        assert!(a < b && b < c);
        assert_eq!(c.to_string(), "#11:1");
    }
}
