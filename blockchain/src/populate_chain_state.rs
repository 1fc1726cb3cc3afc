use primitives::hash::H256;
use chain::IndexedBlockHeader;
use network::ConsensusParams;
use storage::BlockHeaderProvider;
use verification::{ChainState, Error};
use header_branch::HeaderBranch;

/// Builds the `ChainState` a validator needs for a candidate block.
///
/// Every read goes to the in-flight branch first and falls back to the
/// stored chain, so a query for a fork in progress sees headers already
/// appended to the branch as if they were confirmed. A single missing datum
/// abandons the request.
pub struct ChainStatePopulator<'a> {
	headers: &'a BlockHeaderProvider,
	consensus: &'a ConsensusParams,
}

impl<'a> ChainStatePopulator<'a> {
	pub fn new(headers: &'a BlockHeaderProvider, consensus: &'a ConsensusParams) -> Self {
		ChainStatePopulator {
			headers: headers,
			consensus: consensus,
		}
	}

	pub fn populate(
		&self,
		candidate: &IndexedBlockHeader,
		height: u32,
		branch: &HeaderBranch,
	) -> Result<ChainState, Error> {
		let map = ChainState::map(height, self.consensus);

		let ordered_bits = self.populate_window(height, map.bits_count, branch, |header| header.raw.bits)?;
		let ordered_versions = self.populate_window(height, map.versions_count, branch, |header| header.raw.version)?;
		let ordered_timestamps = self.populate_window(height, map.timestamps_count, branch, |header| header.raw.time)?;

		// the retarget timestamp is fetched only on a difficulty boundary
		let retarget_timestamp = match map.retarget_height {
			Some(retarget_height) => Some(self.header_at(retarget_height, branch)?.raw.time),
			None => None,
		};

		// the agreement hash is fetched only when the rule set tolerates
		// transaction-id collisions at this height
		let collision_hash = match map.collision_height {
			Some(collision_height) => Some(self.hash_at(collision_height, candidate, height, branch)?),
			None => None,
		};

		Ok(ChainState {
			height: height,
			hash: candidate.hash.clone(),
			version: candidate.raw.version,
			time: candidate.raw.time,
			bits: candidate.raw.bits,
			ordered_bits: ordered_bits,
			ordered_versions: ordered_versions,
			ordered_timestamps: ordered_timestamps,
			retarget_timestamp: retarget_timestamp,
			collision_hash: collision_hash,
		})
	}

	fn populate_window<T, F>(&self, height: u32, count: usize, branch: &HeaderBranch, f: F) -> Result<Vec<T>, Error>
		where F: Fn(&IndexedBlockHeader) -> T
	{
		let mut window = Vec::with_capacity(count);
		let first = height - count as u32;
		for ancestor_height in first..height {
			window.push(f(&self.header_at(ancestor_height, branch)?));
		}
		Ok(window)
	}

	fn header_at(&self, height: u32, branch: &HeaderBranch) -> Result<IndexedBlockHeader, Error> {
		if let Some(header) = branch.header(height) {
			return Ok(header.clone());
		}

		self.headers.block_header(height.into()).ok_or(Error::OperationFailed)
	}

	fn hash_at(
		&self,
		height: u32,
		candidate: &IndexedBlockHeader,
		candidate_height: u32,
		branch: &HeaderBranch,
	) -> Result<H256, Error> {
		if height == candidate_height {
			return Ok(candidate.hash.clone());
		}

		if let Some(hash) = branch.block_hash(height) {
			return Ok(hash);
		}

		self.headers.block_hash(height).ok_or(Error::OperationFailed)
	}
}
