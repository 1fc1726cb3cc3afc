use primitives::hash::H256;
use chain::{IndexedBlock, IndexedBlockHeader};

/// An in-flight branch above the stored chain.
///
/// While a fork is being validated block by block, the already-accepted part
/// of it is visible here, so chain-state queries for the next candidate see
/// those headers as if they were confirmed. `fork` is the height of the last
/// stored block the branch builds on (`None` when the branch starts at the
/// bottom of an empty chain); `blocks` are ordered parent first.
pub struct HeaderBranch<'a> {
	fork: Option<u32>,
	blocks: &'a [IndexedBlock],
}

impl<'a> HeaderBranch<'a> {
	pub fn new(fork: Option<u32>, blocks: &'a [IndexedBlock]) -> Self {
		HeaderBranch {
			fork: fork,
			blocks: blocks,
		}
	}

	/// Height of the first branch block.
	pub fn first_height(&self) -> u32 {
		match self.fork {
			Some(fork) => fork + 1,
			None => 0,
		}
	}

	fn index_of(&self, height: u32) -> Option<usize> {
		let first = self.first_height();
		if height < first {
			return None;
		}

		let index = (height - first) as usize;
		if index < self.blocks.len() {
			Some(index)
		} else {
			None
		}
	}

	pub fn header(&self, height: u32) -> Option<&IndexedBlockHeader> {
		self.index_of(height).map(|index| &self.blocks[index].header)
	}

	pub fn block_hash(&self, height: u32) -> Option<H256> {
		self.header(height).map(|header| header.hash.clone())
	}
}
