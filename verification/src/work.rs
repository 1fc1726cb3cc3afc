use primitives::compact::Compact;
use primitives::hash::H256;
use primitives::bigint::U256;
use network::ConsensusParams;
use chain_state::ChainState;

/// Returns true if hash is lower or equal than target represented by compact bits
pub fn is_valid_proof_of_work_hash(bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	let value = U256::from(&*hash.reversed() as &[u8]);
	value <= target
}

/// Returns true if hash is lower or equal than target and target is within
/// (0, network maximum]
pub fn is_valid_proof_of_work(maximum: U256, bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	if target.is_zero() || target > maximum {
		return false;
	}

	let value = U256::from(&*hash.reversed() as &[u8]);
	value <= target
}

/// Amount of work the chain gains with a block of the given bits.
pub fn block_proof(bits: Compact) -> U256 {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return U256::zero(),
	};

	// 2**256 / (target + 1) == ~target / (target + 1) + 1
	(!target / (target + U256::from(1u64))) + U256::from(1u64)
}

/// Returns work required for a block on top of the given chain state.
pub fn work_required(state: &ChainState, consensus: &ConsensusParams) -> Compact {
	let maximum = consensus.network.max_bits();
	let max_bits = Compact::from_u256(maximum.clone());
	if state.height == 0 {
		return max_bits;
	}

	let parent_bits = *state.ordered_bits.last()
		.expect("height != 0; the populated bits window ends at the parent; qed");

	if state.height % consensus.retargeting_interval != 0 {
		if consensus.allow_min_difficulty_blocks {
			return work_required_min_difficulty(state, consensus, max_bits, parent_bits);
		}
		return parent_bits;
	}

	let actual_timespan = state.actual_timespan()
		.expect("retarget boundary; the populator fetched the retarget timestamp; qed");
	work_required_retarget(parent_bits, actual_timespan, consensus, maximum, max_bits)
}

fn work_required_retarget(
	parent_bits: Compact,
	actual_timespan: u32,
	consensus: &ConsensusParams,
	maximum: U256,
	max_bits: Compact,
) -> Compact {
	let parent_target = match parent_bits.to_u256() {
		Ok(target) => target,
		_err => return max_bits,
	};

	// constrain the time between an upper and lower bound
	let timespan = range_constrain(
		actual_timespan,
		consensus.target_timespan / 4,
		consensus.target_timespan * 4,
	);

	let (retarget, overflow) = parent_target.overflowing_mul(U256::from(timespan));
	if overflow {
		// the true product exceeds 2**256, which is above any valid maximum
		return max_bits;
	}
	let retarget = retarget / U256::from(consensus.target_timespan);

	if retarget > maximum {
		max_bits
	} else {
		Compact::from_u256(retarget)
	}
}

/// Testnet rule: when no block arrived for twice the target spacing, a block
/// at the minimum difficulty is allowed; otherwise the difficulty of the
/// last non-minimum block since the retarget boundary applies.
fn work_required_min_difficulty(
	state: &ChainState,
	consensus: &ConsensusParams,
	max_bits: Compact,
	parent_bits: Compact,
) -> Compact {
	let parent_timestamp = match state.ordered_timestamps.last() {
		Some(timestamp) => *timestamp,
		None => return parent_bits,
	};

	let max_time_gap = parent_timestamp + 2 * consensus.target_spacing;
	if state.time > max_time_gap {
		return max_bits;
	}

	state.ordered_bits.iter().rev()
		.find(|bits| **bits != max_bits)
		.cloned()
		.unwrap_or(max_bits)
}

fn range_constrain(value: u32, min: u32, max: u32) -> u32 {
	if value < min {
		min
	} else if value > max {
		max
	} else {
		value
	}
}

#[cfg(test)]
mod tests {
	use primitives::compact::Compact;
	use primitives::bigint::U256;
	use primitives::hash::H256;
	use network::{ConsensusParams, Network};
	use chain_state::ChainState;
	use super::{is_valid_proof_of_work, is_valid_proof_of_work_hash, block_proof, work_required};

	fn state(height: u32) -> ChainState {
		ChainState {
			height: height,
			hash: 1u8.into(),
			version: 1,
			time: 0,
			bits: 0u32.into(),
			ordered_bits: Vec::new(),
			ordered_versions: Vec::new(),
			ordered_timestamps: Vec::new(),
			retarget_timestamp: None,
			collision_hash: None,
		}
	}

	fn mainnet() -> ConsensusParams {
		ConsensusParams::new(Network::Mainnet)
	}

	// block 2 from the main chain
	#[test]
	fn test_is_valid_proof_of_work() {
		let hash = H256::from_reversed_str("000000006a625f06636b8bb6ac7b960a8d03705d1ace08b1a19da3fdcc99ddbd");
		let bits = Compact::new(486604799);
		assert!(is_valid_proof_of_work_hash(bits, &hash));
		assert!(is_valid_proof_of_work(Network::Mainnet.max_bits(), bits, &hash));
	}

	#[test]
	fn test_is_invalid_proof_of_work() {
		// a hash above the target
		let hash = H256::from_reversed_str("ffffffff6a625f06636b8bb6ac7b960a8d03705d1ace08b1a19da3fdcc99ddbd");
		let bits = Compact::new(486604799);
		assert!(!is_valid_proof_of_work_hash(bits, &hash));
		assert!(!is_valid_proof_of_work(Network::Mainnet.max_bits(), bits, &hash));

		// an easy target above the network maximum
		let easy_hash = H256::from_reversed_str("000000006a625f06636b8bb6ac7b960a8d03705d1ace08b1a19da3fdcc99ddbd");
		assert!(!is_valid_proof_of_work(Network::Mainnet.max_bits(), Compact::new(0x2100ffff), &easy_hash));
	}

	#[test]
	fn test_work_required_genesis() {
		let consensus = mainnet();
		assert_eq!(work_required(&state(0), &consensus), Compact::new(0x1d00ffff));
	}

	#[test]
	fn test_work_required_between_boundaries_keeps_parent_bits() {
		let consensus = mainnet();
		let mut s = state(100);
		s.ordered_bits = vec![Compact::new(0x1c05a3f4)];
		assert_eq!(work_required(&s, &consensus), Compact::new(0x1c05a3f4));
	}

	// retarget of the first difficulty change on the main chain:
	// blocks 30240 (bits 0x1d00ffff) -> work required for 32256 is 0x1d00d86a
	#[test]
	fn test_work_required_retarget() {
		let consensus = mainnet();
		let mut s = state(32256);
		s.ordered_bits = vec![Compact::new(0x1d00ffff)];
		// timestamps of blocks 30239 and 32255
		s.retarget_timestamp = Some(1261130161);
		s.ordered_timestamps = vec![1262152739];
		assert_eq!(work_required(&s, &consensus), Compact::new(0x1d00d86a));
	}

	#[test]
	fn test_work_required_retarget_clamps_fast_interval() {
		let consensus = mainnet();
		let mut s = state(2016);
		s.ordered_bits = vec![Compact::new(0x1c05a3f4)];
		// the interval took one second: constrained to timespan / 4
		s.retarget_timestamp = Some(1000);
		s.ordered_timestamps = vec![1001];

		let expected = {
			let quarter = consensus.target_timespan as u64 / 4;
			let target = Compact::new(0x1c05a3f4).to_u256().unwrap();
			Compact::from_u256(target * U256::from(quarter) / U256::from(consensus.target_timespan))
		};
		assert_eq!(work_required(&s, &consensus), expected);
	}

	#[test]
	fn test_work_required_min_difficulty_gap() {
		let mut consensus = ConsensusParams::new(Network::Testnet);
		consensus.allow_min_difficulty_blocks = true;
		let max_bits = Compact::from_u256(consensus.network.max_bits());

		let mut s = state(100);
		s.ordered_bits = vec![Compact::new(0x1c05a3f4)];
		s.ordered_timestamps = vec![10_000];

		// no block for 20 minutes: minimum difficulty applies
		s.time = 10_000 + 2 * consensus.target_spacing + 1;
		assert_eq!(work_required(&s, &consensus), max_bits);

		// otherwise the last non-minimum difficulty applies
		s.time = 10_000 + 60;
		assert_eq!(work_required(&s, &consensus), Compact::new(0x1c05a3f4));

		// min-difficulty parents are skipped while searching for it
		s.ordered_bits = vec![Compact::new(0x1c05a3f4), max_bits, max_bits];
		assert_eq!(work_required(&s, &consensus), Compact::new(0x1c05a3f4));
	}

	#[test]
	fn test_block_proof() {
		// work of the easiest representable target is tiny, and grows as the
		// target shrinks
		let easy = block_proof(Compact::new(0x2100ffff));
		let mainnet_genesis = block_proof(Compact::new(0x1d00ffff));
		assert!(easy < mainnet_genesis);
		// genesis chain work is 0x100010001
		assert_eq!(mainnet_genesis, U256::from(0x1_0001_0001u64));

		// invalid bits carry no work
		assert_eq!(block_proof(Compact::new(0x04923456)), U256::zero());
	}
}
