//! Entity key derivation.
//!
//! Single-component keys are the canonical (lower-case, `0x`-prefixed) hex
//! form of the address or id carried by the event. Composite keys join their
//! components with [`ID_SEPARATOR`], which cannot occur in a hex string.

use stakegraph_common_types::{Address, Bytes32};
use stakegraph_store::models::GraphNetwork;

pub const ID_SEPARATOR: char = '-';

pub fn account_id(address: &Address) -> String {
    address.to_string()
}

pub fn deployment_id(deployment: &Bytes32) -> String {
    deployment.to_string()
}

pub fn join_id(parts: &[&str]) -> String {
    parts.join(&ID_SEPARATOR.to_string())
}

pub fn split_id(id: &str) -> Vec<&str> {
    id.split(ID_SEPARATOR).collect()
}

/// Key of the delegator×indexer pair.
pub fn delegated_stake_id(delegator: &str, indexer: &str) -> String {
    join_id(&[delegator, indexer])
}

/// Epochs and pools are keyed by the decimal epoch number.
pub fn epoch_id(epoch: u64) -> String {
    epoch.to_string()
}

/// The epoch a block falls into, and that epoch's block range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochPosition {
    pub number: u64,
    pub start_block: u64,
    /// Last block of the epoch, inclusive.
    pub end_block: u64,
}

/// Locates `block` relative to the network's epoch anchor, i.e. the first
/// block of `current_epoch`. Blocks before the anchor are attributed to the
/// current epoch; epochs only ever move forward.
pub fn epoch_at(network: &GraphNetwork, block: u64) -> EpochPosition {
    let length = network.epoch_length.max(1);
    let elapsed = block.saturating_sub(network.last_length_update_block) / length;
    let start_block = network
        .last_length_update_block
        .saturating_add(elapsed.saturating_mul(length));

    EpochPosition {
        number: network.current_epoch.saturating_add(elapsed),
        start_block,
        end_block: start_block.saturating_add(length - 1),
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn network(epoch_length: u64, anchor: u64, current_epoch: u64) -> GraphNetwork {
        GraphNetwork::new(Address::default(), epoch_length, anchor, current_epoch)
    }

    fn address(seed: u64) -> Address {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&seed.to_be_bytes());
        Address::from(bytes)
    }

    #[quickcheck]
    fn composite_ids_split_back(delegator: u64, indexer: u64) -> bool {
        let d = account_id(&address(delegator));
        let i = account_id(&address(indexer));
        split_id(&delegated_stake_id(&d, &i)) == vec![d.as_str(), i.as_str()]
    }

    #[test]
    fn canonical_account_ids() {
        let address: Address = "0xF55041E37E12cD407ad00CE2910B8269B01263b9"
            .parse()
            .unwrap();
        assert_eq!(
            account_id(&address),
            "0xf55041e37e12cd407ad00ce2910b8269b01263b9"
        );
    }

    #[test]
    fn epochs_from_the_anchor() {
        let network = network(100, 1000, 5);

        assert_eq!(
            epoch_at(&network, 1000),
            EpochPosition {
                number: 5,
                start_block: 1000,
                end_block: 1099
            }
        );
        assert_eq!(epoch_at(&network, 1099).number, 5);
        assert_eq!(epoch_at(&network, 1100).number, 6);
        assert_eq!(epoch_at(&network, 1350).start_block, 1300);
        // Before the anchor.
        assert_eq!(epoch_at(&network, 10).number, 5);
    }

    #[test]
    fn huge_epoch_lengths_saturate() {
        let single_epoch = network(u64::MAX, 10, 0);
        assert_eq!(
            epoch_at(&single_epoch, 500),
            EpochPosition {
                number: 0,
                start_block: 10,
                end_block: u64::MAX
            }
        );

        let near_the_end = network(u64::MAX / 2, u64::MAX - 5, u64::MAX);
        let position = epoch_at(&near_the_end, u64::MAX);
        assert_eq!(position.number, u64::MAX);
        assert_eq!(position.end_block, u64::MAX);
    }

    #[quickcheck]
    fn epochs_never_go_backwards(length: u8, anchor: u16, a: u32, b: u32) -> bool {
        let network = network(u64::from(length), u64::from(anchor), 0);
        let (lo, hi) = (a.min(b), a.max(b));
        epoch_at(&network, u64::from(lo)).number <= epoch_at(&network, u64::from(hi)).number
    }

    #[quickcheck]
    fn moving_the_anchor_forward_keeps_epochs(length: u8, block: u32, later: u32) -> bool {
        let mut network = network(u64::from(length).max(1), 0, 0);
        let position = epoch_at(&network, u64::from(block));
        let later_block = u64::from(block) + u64::from(later);
        let before = epoch_at(&network, later_block);

        network.current_epoch = position.number;
        network.last_length_update_block = position.start_block;
        epoch_at(&network, later_block) == before
    }
}
