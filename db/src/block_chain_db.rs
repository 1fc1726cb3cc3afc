use std::collections::HashMap;
use parking_lot::RwLock;
use primitives::hash::H256;
use chain::{IndexedBlock, IndexedBlockHeader, IndexedTransaction, OutPoint, TransactionOutput};
use storage::{
	BestBlock, BlockChain, BlockHeaderProvider, BlockProvider, BlockRef, Error,
	Store, TransactionMeta, TransactionMetaProvider, TransactionOutputProvider,
	TransactionProvider,
};

/// In-memory blockchain database.
///
/// The whole chain state lives under a single lock, so a reorganization is
/// atomic with respect to readers: they observe the chain either before or
/// after the swap, never in between.
pub struct BlockChainDatabase {
	data: RwLock<ChainData>,
}

#[derive(Default)]
struct ChainData {
	/// canonical chain, indexed by height
	canon: Vec<H256>,
	/// block hash -> height
	numbers: HashMap<H256, u32>,
	/// block hash -> body, canonical blocks only
	blocks: HashMap<H256, IndexedBlock>,
	/// transaction id -> body
	transactions: HashMap<H256, IndexedTransaction>,
	/// transaction id -> confirmation + spend info
	metas: HashMap<H256, TransactionMeta>,
}

impl BlockChainDatabase {
	pub fn new() -> Self {
		BlockChainDatabase {
			data: RwLock::new(ChainData::default()),
		}
	}

	/// Builds a database prepopulated with the given chain.
	///
	/// The blocks are attached without any validation. Test helper.
	pub fn init_test_chain(blocks: Vec<IndexedBlock>) -> Self {
		let db = BlockChainDatabase::new();
		for (index, block) in blocks.into_iter().enumerate() {
			let fork = match index {
				0 => None,
				_ => Some(index as u32 - 1),
			};
			db.reorganize(fork, &[block], &[]).expect("test chain is well formed; qed");
		}
		db
	}
}

impl ChainData {
	fn best_number(&self) -> Option<u32> {
		match self.canon.len() {
			0 => None,
			len => Some(len as u32 - 1),
		}
	}

	fn check_reorganize(&self, fork: Option<u32>, incoming: &[IndexedBlock], outgoing: &[H256]) -> Result<(), Error> {
		// outgoing must be the current suffix above the fork, tip first
		let mut number = match self.best_number() {
			Some(number) => number as i64,
			None if outgoing.is_empty() => -1,
			None => return Err(Error::CannotDecanonize),
		};

		for hash in outgoing {
			if number < 0 || self.canon.get(number as usize) != Some(hash) {
				return Err(Error::CannotDecanonize);
			}
			number -= 1;
		}

		let fork_number = fork.map(|f| f as i64).unwrap_or(-1);
		if number != fork_number {
			return Err(Error::InconsistentData);
		}

		// incoming must chain from the fork block
		let mut parent = match fork {
			Some(number) => match self.canon.get(number as usize) {
				Some(hash) => hash.clone(),
				None => return Err(Error::InconsistentData),
			},
			None => H256::default(),
		};

		for block in incoming {
			if block.header.raw.previous_header_hash != parent {
				return Err(Error::UnknownParent);
			}
			parent = block.header.hash.clone();
		}

		Ok(())
	}

	fn decanonize_tip(&mut self, hash: &H256) {
		self.canon.pop();
		self.numbers.remove(hash);

		let block = self.blocks.remove(hash).expect("checked by check_reorganize; qed");
		for (index, tx) in block.transactions.iter().enumerate() {
			self.transactions.remove(&tx.hash);
			self.metas.remove(&tx.hash);

			if index == 0 {
				continue;
			}
			for input in &tx.raw.inputs {
				if let Some(meta) = self.metas.get_mut(&input.previous_output.hash) {
					meta.note_unspent(input.previous_output.index as usize);
				}
			}
		}
	}

	fn canonize(&mut self, block: &IndexedBlock) {
		let height = self.canon.len() as u32;
		let hash = block.header.hash.clone();

		self.canon.push(hash.clone());
		self.numbers.insert(hash.clone(), height);
		self.blocks.insert(hash, block.clone());

		for (index, tx) in block.transactions.iter().enumerate() {
			let mut meta = TransactionMeta::new(height, tx.raw.outputs.len());
			if index == 0 {
				meta = meta.coinbase();
			}
			self.metas.insert(tx.hash.clone(), meta);
			self.transactions.insert(tx.hash.clone(), tx.clone());

			if index == 0 {
				continue;
			}
			for input in &tx.raw.inputs {
				if let Some(meta) = self.metas.get_mut(&input.previous_output.hash) {
					meta.note_spent(input.previous_output.index as usize, height);
				}
			}
		}
	}
}

impl BlockChain for BlockChainDatabase {
	fn reorganize(&self, fork: Option<u32>, incoming: &[IndexedBlock], outgoing: &[H256]) -> Result<(), Error> {
		let mut data = self.data.write();

		// validate everything up front so the mutation below cannot fail
		// half way through
		data.check_reorganize(fork, incoming, outgoing)?;

		for hash in outgoing {
			data.decanonize_tip(hash);
		}

		for block in incoming {
			data.canonize(block);
		}

		Ok(())
	}
}

impl BlockHeaderProvider for BlockChainDatabase {
	fn block_header(&self, block_ref: BlockRef) -> Option<IndexedBlockHeader> {
		let data = self.data.read();
		let hash = match block_ref {
			BlockRef::Number(number) => data.canon.get(number as usize)?.clone(),
			BlockRef::Hash(hash) => hash,
		};
		data.blocks.get(&hash).map(|block| block.header.clone())
	}

	fn block_number(&self, hash: &H256) -> Option<u32> {
		self.data.read().numbers.get(hash).cloned()
	}

	fn block_hash(&self, number: u32) -> Option<H256> {
		self.data.read().canon.get(number as usize).cloned()
	}
}

impl BlockProvider for BlockChainDatabase {
	fn block(&self, block_ref: BlockRef) -> Option<IndexedBlock> {
		let data = self.data.read();
		let hash = match block_ref {
			BlockRef::Number(number) => data.canon.get(number as usize)?.clone(),
			BlockRef::Hash(hash) => hash,
		};
		data.blocks.get(&hash).cloned()
	}
}

impl TransactionProvider for BlockChainDatabase {
	fn transaction(&self, hash: &H256) -> Option<IndexedTransaction> {
		self.data.read().transactions.get(hash).cloned()
	}
}

impl TransactionMetaProvider for BlockChainDatabase {
	fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta> {
		self.data.read().metas.get(hash).cloned()
	}
}

impl TransactionOutputProvider for BlockChainDatabase {
	fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
		self.data.read().transactions.get(&outpoint.hash)
			.and_then(|tx| tx.raw.outputs.get(outpoint.index as usize))
			.cloned()
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.data.read().metas.get(&outpoint.hash)
			.map_or(false, |meta| meta.is_spent(outpoint.index as usize))
	}
}

impl Store for BlockChainDatabase {
	fn best_block(&self) -> Option<BestBlock> {
		let data = self.data.read();
		data.best_number().map(|number| BestBlock {
			number: number,
			hash: data.canon[number as usize].clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use test_data;
	use chain::{IndexedBlock, OutPoint};
	use storage::{BlockChain, BlockProvider, BlockHeaderProvider, Error, Store,
		TransactionMetaProvider, TransactionOutputProvider};
	use super::BlockChainDatabase;

	fn test_chain() -> Vec<IndexedBlock> {
		let b0 = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(100).build()
			.build();
		let b1 = test_data::block_builder()
			.transaction()
				.coinbase("0001".into())
				.output().value(50).build()
				.build()
			.transaction()
				.input().hash(b0.transactions[0].hash()).build()
				.output().value(30).build()
				.build()
			.merkled_header().time(200).parent(b0.hash()).build()
			.build();
		vec![b0.into(), b1.into()]
	}

	#[test]
	fn test_extend_and_query() {
		let chain = test_chain();
		let db = BlockChainDatabase::init_test_chain(chain.clone());

		let best = db.best_block().unwrap();
		assert_eq!(best.number, 1);
		assert_eq!(&best.hash, chain[1].hash());

		assert_eq!(db.block_number(chain[0].hash()), Some(0));
		assert_eq!(db.block_hash(1), Some(chain[1].hash().clone()));
		assert_eq!(db.block(1u32.into()), Some(chain[1].clone()));

		// the output of the first coinbase is spent at height 1
		let coinbase_hash = chain[0].transactions[0].hash.clone();
		let meta = db.transaction_meta(&coinbase_hash).unwrap();
		assert!(meta.is_coinbase());
		assert!(meta.is_spent(0));
		assert!(meta.is_spent_below(0, 1));
		assert!(!meta.is_spent_below(0, 0));
		assert!(db.is_spent(&OutPoint { hash: coinbase_hash, index: 0 }));
	}

	#[test]
	fn test_reorganize_swaps_branches() {
		let chain = test_chain();
		let db = BlockChainDatabase::init_test_chain(chain.clone());

		let b1_side = test_data::block_builder()
			.transaction()
				.coinbase("0002".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(300).parent(chain[0].hash().clone()).build()
			.build();
		let b2_side = test_data::block_builder()
			.transaction()
				.coinbase("0003".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(400).parent(b1_side.hash()).build()
			.build();

		let incoming = vec![b1_side.into(), b2_side.into()];
		db.reorganize(Some(0), &incoming, &[chain[1].hash().clone()]).unwrap();

		let best = db.best_block().unwrap();
		assert_eq!(best.number, 2);
		assert_eq!(&best.hash, incoming[1].hash());

		// the replaced block is gone, and the coinbase spend was unwound
		assert_eq!(db.block_number(chain[1].hash()), None);
		let coinbase_hash = chain[0].transactions[0].hash.clone();
		assert!(!db.is_spent(&OutPoint { hash: coinbase_hash, index: 0 }));
	}

	#[test]
	fn test_reorganize_rejects_mismatched_outgoing() {
		let chain = test_chain();
		let db = BlockChainDatabase::init_test_chain(chain.clone());

		// outgoing list does not start at the tip
		assert_eq!(
			db.reorganize(None, &[], &[chain[0].hash().clone()]),
			Err(Error::CannotDecanonize),
		);
	}

	#[test]
	fn test_reorganize_rejects_unknown_parent() {
		let chain = test_chain();
		let db = BlockChainDatabase::init_test_chain(chain.clone());

		let stranger: IndexedBlock = test_data::block_builder()
			.transaction().coinbase("0004".into()).output().value(50).build().build()
			.merkled_header().time(500).parent(5u8.into()).build()
			.build()
			.into();

		assert_eq!(
			db.reorganize(Some(1), &[stranger], &[]),
			Err(Error::UnknownParent),
		);
	}

	#[test]
	fn test_empty_database() {
		let db = BlockChainDatabase::new();
		assert_eq!(db.best_block(), None);
		assert!(db.is_blocks_stale(60 * 60, 1000));
	}
}

