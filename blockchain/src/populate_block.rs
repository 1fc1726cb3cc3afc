use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::channel;
use parking_lot::Mutex;
use time::get_time;
use primitives::hash::H256;
use chain::{IndexedBlock, OutPoint, TransactionOutput};
use network::{ConsensusParams, ForkFlags};
use dispatcher::Dispatcher;
use storage::{SharedStore, Store, TransactionMeta, TransactionMetaProvider, TransactionOutputProvider, TransactionProvider};
use verification::Error;

/// Previous-output data of a candidate block, resolved before connection.
///
/// The connector reads it through the ordinary provider traits; everything
/// is already filtered by the fork height, so "spent" means spent at or
/// below the fork (or by an earlier branch block), and a funding transaction
/// above the fork point simply does not exist here.
pub struct PopulatedBlock {
	prevouts: HashMap<OutPoint, PopulatedOutput>,
	metas: HashMap<H256, TransactionMeta>,
}

#[derive(Clone)]
struct PopulatedOutput {
	output: TransactionOutput,
	height: u32,
	coinbase: bool,
	spent: bool,
}

impl TransactionOutputProvider for PopulatedBlock {
	fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
		self.prevouts.get(outpoint).map(|populated| populated.output.clone())
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.prevouts.get(outpoint).map_or(false, |populated| populated.spent)
	}
}

impl TransactionMetaProvider for PopulatedBlock {
	fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta> {
		self.metas.get(hash).cloned()
	}
}

/// Lookup tables over the in-flight branch blocks, built once per candidate
/// so the parallel buckets share them read-only.
struct BranchIndex {
	/// outputs created by branch blocks
	outputs: HashMap<OutPoint, PopulatedOutput>,
	/// outputs consumed by branch blocks
	spent: HashSet<OutPoint>,
}

impl BranchIndex {
	fn new(first_height: u32, branch: &[IndexedBlock]) -> Self {
		let mut outputs = HashMap::new();
		let mut spent = HashSet::new();

		for (index, block) in branch.iter().enumerate() {
			let height = first_height + index as u32;
			for (transaction_index, tx) in block.transactions.iter().enumerate() {
				for (output_index, output) in tx.raw.outputs.iter().enumerate() {
					outputs.insert(OutPoint {
						hash: tx.hash.clone(),
						index: output_index as u32,
					}, PopulatedOutput {
						output: output.clone(),
						height: height,
						coinbase: transaction_index == 0,
						spent: false,
					});
				}

				if transaction_index != 0 {
					for input in &tx.raw.inputs {
						spent.insert(input.previous_output.clone());
					}
				}
			}
		}

		BranchIndex {
			outputs: outputs,
			spent: spent,
		}
	}
}

/// Attaches previous-output data to every input of the candidate block.
///
/// Inputs are distributed over `B` dispatcher buckets as `input i -> bucket
/// i mod B`; every bucket fills a private vector, and the vectors are merged
/// after the join. The coinbase needs no population. With a single worker
/// (or a single input) everything happens inline.
pub fn populate_block(
	store: SharedStore,
	consensus: &ConsensusParams,
	dispatcher: &Dispatcher,
	block: &IndexedBlock,
	fork: Option<u32>,
	branch: &[IndexedBlock],
) -> Result<PopulatedBlock, Error> {
	let first_height = fork.map(|f| f + 1).unwrap_or(0);
	let branch_index = Arc::new(BranchIndex::new(first_height, branch));

	let outpoints: Vec<OutPoint> = block.transactions.iter()
		.skip(1)
		.flat_map(|tx| tx.raw.inputs.iter())
		.map(|input| input.previous_output.clone())
		.collect();

	let prevouts = {
		// one bucket per spare worker; the caller occupies one already
		let buckets = dispatcher.size().saturating_sub(1).min(outpoints.len());
		if buckets < 2 {
			let mut prevouts = HashMap::new();
			for outpoint in outpoints {
				if let Some(populated) = populate_input(&*store, &branch_index, fork, &outpoint) {
					prevouts.insert(outpoint, populated);
				}
			}
			prevouts
		} else {
			populate_buckets(store.clone(), dispatcher, branch_index.clone(), fork, outpoints, buckets)?
		}
	};

	let metas = populate_metas(&*store, consensus, fork, block, &prevouts);

	Ok(PopulatedBlock {
		prevouts: prevouts,
		metas: metas,
	})
}

fn populate_buckets(
	store: SharedStore,
	dispatcher: &Dispatcher,
	branch_index: Arc<BranchIndex>,
	fork: Option<u32>,
	outpoints: Vec<OutPoint>,
	buckets: usize,
) -> Result<HashMap<OutPoint, PopulatedOutput>, Error> {
	let mut bucket_inputs: Vec<Vec<OutPoint>> = (0..buckets).map(|_| Vec::new()).collect();
	for (index, outpoint) in outpoints.into_iter().enumerate() {
		bucket_inputs[index % buckets].push(outpoint);
	}

	let results = Arc::new(Mutex::new(HashMap::new()));
	let (done_tx, done_rx) = channel();

	let work = {
		let results = results.clone();
		move |bucket: Vec<OutPoint>| -> Result<(), Error> {
			let mut populated = Vec::with_capacity(bucket.len());
			for outpoint in bucket {
				if let Some(output) = populate_input(&*store, &branch_index, fork, &outpoint) {
					populated.push((outpoint, output));
				}
			}
			results.lock().extend(populated);
			Ok(())
		}
	};

	dispatcher.parallel(bucket_inputs, work, move |result| {
		let _ = done_tx.send(result);
	});

	done_rx.recv().map_err(|_| Error::OperationFailed)??;

	let populated = ::std::mem::replace(&mut *results.lock(), HashMap::new());
	Ok(populated)
}

fn populate_input(
	store: &Store,
	branch_index: &BranchIndex,
	fork: Option<u32>,
	outpoint: &OutPoint,
) -> Option<PopulatedOutput> {
	// branch outputs shadow the stored chain
	if let Some(populated) = branch_index.outputs.get(outpoint) {
		let mut populated = populated.clone();
		populated.spent = branch_index.spent.contains(outpoint);
		return Some(populated);
	}

	// stored outputs only count when confirmed at or below the fork
	let fork = match fork {
		Some(fork) => fork,
		None => return None,
	};

	let meta = store.transaction_meta(&outpoint.hash)?;
	if meta.height() > fork {
		return None;
	}

	let tx = store.transaction(&outpoint.hash)?;
	let output = tx.raw.outputs.get(outpoint.index as usize)?.clone();
	let spent = meta.is_spent_below(outpoint.index as usize, fork)
		|| branch_index.spent.contains(outpoint);

	Some(PopulatedOutput {
		output: output,
		height: meta.height(),
		coinbase: meta.is_coinbase(),
		spent: spent,
	})
}

fn populate_metas(
	store: &Store,
	consensus: &ConsensusParams,
	fork: Option<u32>,
	block: &IndexedBlock,
	prevouts: &HashMap<OutPoint, PopulatedOutput>,
) -> HashMap<H256, TransactionMeta> {
	let mut metas = HashMap::new();

	// funding metas drive the maturity check
	for (outpoint, populated) in prevouts {
		let meta = TransactionMeta::new(populated.height, 0);
		let meta = if populated.coinbase { meta.coinbase() } else { meta };
		metas.insert(outpoint.hash.clone(), meta);
	}

	// duplicate (bip30) lookups are skipped while the chain is stale: deep
	// historical sync cannot produce new collisions
	let now = get_time().sec as u32;
	let check_duplicates = consensus.forks.contains(ForkFlags::BIP30)
		&& !store.is_blocks_stale(consensus.notify_limit_seconds(), now);

	if check_duplicates {
		if let Some(fork) = fork {
			for tx in &block.transactions {
				if let Some(meta) = store.transaction_meta(&tx.hash) {
					if let Some(filtered) = fork_filtered_meta(meta, fork) {
						metas.insert(tx.hash.clone(), filtered);
					}
				}
			}
		}
	}

	metas
}

/// Restricts a stored meta to what the chain below the fork point knew.
fn fork_filtered_meta(meta: TransactionMeta, fork: u32) -> Option<TransactionMeta> {
	if meta.height() > fork {
		return None;
	}

	let mut filtered = TransactionMeta::new(meta.height(), meta.output_count());
	if meta.is_coinbase() {
		filtered = filtered.coinbase();
	}
	for index in 0..meta.output_count() {
		if let Some(spent_at) = meta.spent_at(index) {
			if spent_at <= fork {
				filtered.note_spent(index, spent_at);
			}
		}
	}

	Some(filtered)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use chain::{IndexedBlock, OutPoint};
	use network::{ConsensusParams, Network};
	use dispatcher::Dispatcher;
	use db::BlockChainDatabase;
	use storage::{SharedStore, TransactionMetaProvider, TransactionOutputProvider};
	use test_data;
	use super::populate_block;

	fn consensus() -> ConsensusParams {
		ConsensusParams::new(Network::Unitest)
	}

	fn stored_chain() -> (Vec<IndexedBlock>, SharedStore) {
		// b0 creates an output, b1 spends it
		let b0 = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(100).build()
				.build()
			.merkled_header().time(100).build()
			.build();
		let b1 = test_data::block_builder()
			.transaction()
				.coinbase("0001".into())
				.output().value(0).build()
				.build()
			.transaction()
				.input().hash(b0.transactions[0].hash()).build()
				.output().value(100).build()
				.build()
			.merkled_header().time(200).parent(b0.hash()).build()
			.build();

		let blocks: Vec<IndexedBlock> = vec![b0.into(), b1.into()];
		let store: SharedStore = Arc::new(BlockChainDatabase::init_test_chain(blocks.clone()));
		(blocks, store)
	}

	fn spending_block(outpoint: OutPoint) -> IndexedBlock {
		test_data::block_builder()
			.transaction()
				.coinbase("0002".into())
				.output().value(0).build()
				.build()
			.transaction()
				.input().hash(outpoint.hash).index(outpoint.index).build()
				.output().value(100).build()
				.build()
			.merkled_header().time(300).build()
			.build()
			.into()
	}

	#[test]
	fn test_populate_respects_fork_height() {
		let (blocks, store) = stored_chain();
		let dispatcher = Dispatcher::new(1, "test");
		let outpoint = OutPoint { hash: blocks[0].transactions[0].hash.clone(), index: 0 };
		let block = spending_block(outpoint.clone());

		// above the spend the output reads as spent
		let populated = populate_block(store.clone(), &consensus(), &dispatcher, &block, Some(1), &[]).unwrap();
		assert!(populated.is_spent(&outpoint));

		// below it the spend never happened
		let populated = populate_block(store.clone(), &consensus(), &dispatcher, &block, Some(0), &[]).unwrap();
		assert!(!populated.is_spent(&outpoint));
		assert!(populated.transaction_output(&outpoint, 1).is_some());

		// the funding meta records the coinbase origin for maturity checks
		let meta = populated.transaction_meta(&outpoint.hash).unwrap();
		assert!(meta.is_coinbase());
		assert_eq!(meta.height(), 0);
	}

	#[test]
	fn test_populate_ignores_outputs_above_fork() {
		let (blocks, store) = stored_chain();
		let dispatcher = Dispatcher::new(1, "test");

		// b1's coinbase does not exist below fork height 0
		let outpoint = OutPoint { hash: blocks[1].transactions[0].hash.clone(), index: 0 };
		let block = spending_block(outpoint.clone());

		let populated = populate_block(store, &consensus(), &dispatcher, &block, Some(0), &[]).unwrap();
		assert!(populated.transaction_output(&outpoint, 1).is_none());
	}

	#[test]
	fn test_populate_prefers_branch_outputs() {
		let (blocks, store) = stored_chain();
		let dispatcher = Dispatcher::new(1, "test");

		// a branch block at height 1 creating a fresh output
		let branch_block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0003".into())
				.output().value(77).build()
				.build()
			.merkled_header().time(250).parent(blocks[0].header.hash.clone()).build()
			.build()
			.into();
		let outpoint = OutPoint { hash: branch_block.transactions[0].hash.clone(), index: 0 };
		let block = spending_block(outpoint.clone());
		let branch = vec![branch_block];

		let populated = populate_block(store, &consensus(), &dispatcher, &block, Some(0), &branch).unwrap();
		let output = populated.transaction_output(&outpoint, 1).unwrap();
		assert_eq!(output.value, 77);

		let meta = populated.transaction_meta(&outpoint.hash).unwrap();
		assert!(meta.is_coinbase());
		assert_eq!(meta.height(), 1);
	}

	#[test]
	fn test_populate_parallel_buckets_match_inline() {
		let parallel = Dispatcher::new(4, "test");
		let inline = Dispatcher::new(1, "test");

		// a funding transaction with enough outputs to engage several buckets
		let mut funding_builder = test_data::block_builder().transaction().coinbase("0000".into());
		for _ in 0..8 {
			funding_builder = funding_builder.output().value(10).build();
		}
		let b0 = funding_builder.build().merkled_header().time(100).build().build();
		let funding_hash = b0.transactions[0].hash();
		let store: SharedStore = Arc::new(BlockChainDatabase::init_test_chain(vec![b0.into()]));

		let mut spender = test_data::block_builder()
			.transaction()
				.coinbase("0004".into())
				.output().value(0).build()
				.build()
			.transaction();
		for index in 0..8 {
			spender = spender.input().hash(funding_hash.clone()).index(index).build();
		}
		let block: IndexedBlock = spender
			.output().value(1).build()
			.build()
			.merkled_header().time(300).build()
			.build()
			.into();

		let populated_inline = populate_block(store.clone(), &consensus(), &inline, &block, Some(0), &[]).unwrap();
		let populated_parallel = populate_block(store, &consensus(), &parallel, &block, Some(0), &[]).unwrap();

		for index in 0..8 {
			let outpoint = OutPoint { hash: funding_hash.clone(), index: index };
			assert_eq!(
				populated_inline.transaction_output(&outpoint, 1),
				populated_parallel.transaction_output(&outpoint, 1)
			);
			assert!(populated_parallel.transaction_output(&outpoint, 1).is_some());
			assert_eq!(populated_inline.is_spent(&outpoint), populated_parallel.is_spent(&outpoint));
		}
	}
}

