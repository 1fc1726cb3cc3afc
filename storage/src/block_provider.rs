use hash::H256;
use chain::{IndexedBlock, IndexedBlockHeader};
use BlockRef;

pub trait BlockHeaderProvider: Send + Sync {
	/// resolves header by block reference
	fn block_header(&self, block_ref: BlockRef) -> Option<IndexedBlockHeader>;

	/// resolves number by block hash
	fn block_number(&self, hash: &H256) -> Option<u32>;

	/// resolves hash by block number
	fn block_hash(&self, number: u32) -> Option<H256>;
}

pub trait BlockProvider: BlockHeaderProvider {
	/// resolves block by block reference
	fn block(&self, block_ref: BlockRef) -> Option<IndexedBlock>;

	/// returns true if the store contains a block with the given hash
	fn contains_block(&self, hash: &H256) -> bool {
		self.block_number(hash).is_some()
	}
}
