//! Context a validator needs about the chain below a candidate block.
//!
//! The windows are populated once (by the chain-state populator) and the
//! state is immutable afterwards, so it can be shared freely across worker
//! threads. All database traffic happens at population time; the acceptors
//! only read from here.

use hash::H256;
use compact::Compact;
use network::{ConsensusParams, ForkFlags};

/// Which ancestor data a chain state for the given height must carry.
///
/// Heights are absolute; windows cover `[high - count, high)` and are stored
/// in ascending height order.
#[derive(Debug, PartialEq)]
pub struct ChainStateMap {
	/// Number of ancestor bits ending at the parent block.
	pub bits_count: usize,
	/// Number of ancestor versions ending at the parent block.
	pub versions_count: usize,
	/// Number of ancestor timestamps ending at the parent block.
	pub timestamps_count: usize,
	/// Height of the retarget-base timestamp, when the candidate sits on a
	/// difficulty boundary.
	pub retarget_height: Option<u32>,
	/// Height whose stored hash must agree before transaction-id collisions
	/// are tolerated.
	pub collision_height: Option<u32>,
}

/// Chain context of a candidate block at a given height.
#[derive(Debug, Clone)]
pub struct ChainState {
	/// Candidate height.
	pub height: u32,
	/// Candidate hash.
	pub hash: H256,
	/// Candidate header version.
	pub version: u32,
	/// Candidate header timestamp.
	pub time: u32,
	/// Candidate header bits.
	pub bits: Compact,
	/// Ancestor bits, ascending by height, ending at the parent block.
	pub ordered_bits: Vec<Compact>,
	/// Ancestor versions, ascending by height, ending at the parent block.
	pub ordered_versions: Vec<u32>,
	/// Ancestor timestamps, ascending by height, ending at the parent block.
	pub ordered_timestamps: Vec<u32>,
	/// Timestamp of the block one retarget interval below the candidate.
	pub retarget_timestamp: Option<u32>,
	/// Stored hash at the collision height from the map.
	pub collision_hash: Option<H256>,
}

impl ChainState {
	/// Computes the population map for a candidate at `height`.
	pub fn map(height: u32, consensus: &ConsensusParams) -> ChainStateMap {
		let bits_count = if consensus.allow_min_difficulty_blocks {
			// reach back to the last difficulty boundary so the min-difficulty
			// exception can find the last regular block
			height.min(::std::cmp::max(1, height % consensus.retargeting_interval))
		} else {
			height.min(1)
		} as usize;

		let versions_count = if consensus.forks.contains(ForkFlags::BIP90) {
			0
		} else {
			(height as usize).min(consensus.version_sample_size)
		};

		let timestamps_count = (height as usize).min(consensus.median_time_span);

		let retarget_height = if height != 0 && height % consensus.retargeting_interval == 0 {
			Some(height - consensus.retargeting_interval)
		} else {
			None
		};

		let collision_height = if consensus.forks.contains(ForkFlags::ALLOW_COLLISIONS)
			&& consensus.is_bip30_exception(height) {
			Some(height)
		} else {
			None
		};

		ChainStateMap {
			bits_count: bits_count,
			versions_count: versions_count,
			timestamps_count: timestamps_count,
			retarget_height: retarget_height,
			collision_height: collision_height,
		}
	}

	/// Median of the ancestor timestamps window.
	///
	/// Zero while the window is empty (genesis has no ancestors).
	pub fn median_time_past(&self) -> u32 {
		if self.ordered_timestamps.is_empty() {
			return 0;
		}

		let mut timestamps = self.ordered_timestamps.clone();
		timestamps.sort();
		timestamps[timestamps.len() / 2]
	}

	/// Time the last retarget interval actually took, in seconds.
	///
	/// Negative intervals (out-of-order timestamps) collapse to zero; the
	/// retarget clamps the value anyway.
	pub fn actual_timespan(&self) -> Option<u32> {
		let retarget_timestamp = self.retarget_timestamp?;
		let last_timestamp = *self.ordered_timestamps.last()?;
		Some(last_timestamp.saturating_sub(retarget_timestamp))
	}

	/// The lowest block version the chain still accepts at this height.
	pub fn minimum_block_version(&self, consensus: &ConsensusParams) -> u32 {
		if consensus.forks.contains(ForkFlags::BIP90) {
			if consensus.forks.contains(ForkFlags::BIP65) && self.height >= consensus.bip65_height {
				4
			} else if consensus.forks.contains(ForkFlags::BIP66) && self.height >= consensus.bip66_height {
				3
			} else if consensus.forks.contains(ForkFlags::BIP34) && self.height > consensus.bip34_height {
				2
			} else {
				1
			}
		} else {
			if consensus.forks.contains(ForkFlags::BIP65) && self.version_enforced(4, consensus) {
				4
			} else if consensus.forks.contains(ForkFlags::BIP66) && self.version_enforced(3, consensus) {
				3
			} else if consensus.forks.contains(ForkFlags::BIP34) && self.version_enforced(2, consensus) {
				2
			} else {
				1
			}
		}
	}

	/// Must a version >= 2 coinbase embed the block height (BIP34)?
	pub fn is_bip34_active(&self, consensus: &ConsensusParams) -> bool {
		if !consensus.forks.contains(ForkFlags::BIP34) {
			return false;
		}

		if consensus.forks.contains(ForkFlags::BIP90) {
			self.height > consensus.bip34_height
		} else {
			self.version_activated(2, consensus)
		}
	}

	/// Is the pay-to-script-hash rule set in force?
	pub fn is_bip16_active(&self, consensus: &ConsensusParams) -> bool {
		consensus.forks.contains(ForkFlags::BIP16) && self.time >= consensus.bip16_time
	}

	/// Cutoff time for transaction finality: the block time, or the
	/// median-time-past once BIP113 is in force.
	pub fn finality_time_cutoff(&self, consensus: &ConsensusParams) -> u32 {
		if consensus.forks.contains(ForkFlags::CSV) {
			self.median_time_past()
		} else {
			self.time
		}
	}

	/// May this block contain a transaction whose id already exists in the
	/// chain? True only at the historical exception heights, and only when
	/// the stored chain agrees with the configured checkpoint there.
	pub fn allows_duplicates(&self, consensus: &ConsensusParams) -> bool {
		if !consensus.forks.contains(ForkFlags::ALLOW_COLLISIONS) {
			return false;
		}

		if !consensus.is_bip30_exception(self.height) {
			return false;
		}

		match consensus.checkpoint(self.height) {
			Some(checkpoint) => self.collision_hash.as_ref() == Some(checkpoint),
			None => true,
		}
	}

	fn version_count(&self, version: u32) -> usize {
		self.ordered_versions.iter().filter(|v| **v >= version).count()
	}

	fn version_activated(&self, version: u32, consensus: &ConsensusParams) -> bool {
		self.version_count(version) >= consensus.version_activation_threshold
	}

	fn version_enforced(&self, version: u32, consensus: &ConsensusParams) -> bool {
		self.version_count(version) >= consensus.version_enforcement_threshold
	}
}
