use std::collections::VecDeque;
use std::sync::Arc;
use parking_lot::Mutex;
use primitives::hash::H256;
use chain::{BlockHeader, IndexedTransaction};
use network::ConsensusParams;
use dispatcher::{Dispatcher, OrderedQueue, StopSignal};
use storage::{BlockHeaderProvider, SharedStore, Store, TransactionMetaProvider, TransactionOutputProvider,
	TransactionProvider};
use verification::constants::MAX_MONEY;
use verification::{ConsensusOracle, MemoryPoolTransactionVerifier};
use blockchain::{BlockList, BlockOrganizer};
use Error;

/// Reports the outcome of validation, together with the indices of inputs
/// whose referenced outputs are pooled but not yet confirmed.
pub type ValidateHandler = Box<FnOnce(Result<Vec<usize>, Error>) + Send>;

/// Fires once per stored entry: on confirmation, eviction or invalidation.
pub type ConfirmHandler = Box<FnOnce(Result<(), Error>) + Send>;

pub type FetchHandler = Box<FnOnce(Result<IndexedTransaction, Error>) + Send>;

pub type ExistsHandler = Box<FnOnce(Result<bool, Error>) + Send>;

struct MempoolEntry {
	hash: H256,
	transaction: IndexedTransaction,
	on_confirm: ConfirmHandler,
}

/// Fixed-capacity FIFO of validated unconfirmed transactions.
///
/// Every operation goes through a single ordered queue, so the buffer is
/// effectively single-writer and operations are serialized against the
/// reorganization notifications as well.
pub struct TransactionPool {
	shared: Arc<PoolShared>,
	queue: OrderedQueue,
}

struct PoolShared {
	store: SharedStore,
	consensus: ConsensusParams,
	oracle: Arc<ConsensusOracle>,
	buffer: Mutex<VecDeque<MempoolEntry>>,
	capacity: usize,
	stop: StopSignal,
}

impl TransactionPool {
	pub fn new(
		store: SharedStore,
		consensus: ConsensusParams,
		oracle: Arc<ConsensusOracle>,
		dispatcher: &Dispatcher,
		capacity: usize,
	) -> Self {
		let queue = dispatcher.ordered();
		let pool = TransactionPool {
			shared: Arc::new(PoolShared {
				store: store,
				consensus: consensus,
				oracle: oracle,
				buffer: Mutex::new(VecDeque::with_capacity(capacity)),
				capacity: capacity,
				stop: StopSignal::new(),
			}),
			queue: queue,
		};
		// the pool starts stopped, like the organizer
		pool.shared.stop.stop();
		pool
	}

	/// Starts intake and subscribes to chain reorganizations.
	pub fn start(pool: &Arc<TransactionPool>, organizer: &Arc<BlockOrganizer>) {
		pool.shared.stop.reset();
		TransactionPool::subscribe(pool.clone(), organizer.clone());
	}

	pub fn stop(&self) {
		self.shared.stop.stop();
	}

	fn subscribe(pool: Arc<TransactionPool>, organizer: Arc<BlockOrganizer>) {
		let subscription_organizer = organizer.clone();
		organizer.subscribe_reorganize(Box::new(move |result, _fork_point, incoming, outgoing| {
			if let Err(_) = result {
				// blockchain -> organizer -> transaction pool shutdown chain
				debug!(target: "mempool", "Stopping transaction pool on organizer shutdown");
				pool.stop();
				return;
			}

			{
				let shared = pool.shared.clone();
				pool.queue.push(move || shared.on_reorganize(incoming, outgoing));
			}

			// subscriptions are one-shot
			TransactionPool::subscribe(pool.clone(), subscription_organizer.clone());
		}));
	}

	/// Validates a transaction against the chain and the pool contents.
	pub fn validate(&self, transaction: IndexedTransaction, handler: ValidateHandler) {
		let shared = self.shared.clone();
		self.queue.push(move || {
			handler(shared.do_validate(&transaction));
		});
	}

	/// Validates and stores a transaction. When the pool is full, the oldest
	/// entry makes room and its confirmation handler fires `pool_filled`.
	pub fn store(&self, transaction: IndexedTransaction, on_confirm: ConfirmHandler, on_validate: ValidateHandler) {
		let shared = self.shared.clone();
		self.queue.push(move || {
			shared.do_store(transaction, on_confirm, on_validate);
		});
	}

	pub fn fetch(&self, hash: H256, handler: FetchHandler) {
		let shared = self.shared.clone();
		self.queue.push(move || {
			handler(shared.do_fetch(&hash));
		});
	}

	pub fn exists(&self, hash: H256, handler: ExistsHandler) {
		let shared = self.shared.clone();
		self.queue.push(move || {
			handler(shared.do_exists(&hash));
		});
	}
}

impl PoolShared {
	fn do_validate(&self, transaction: &IndexedTransaction) -> Result<Vec<usize>, Error> {
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		MemoryPoolTransactionVerifier::new(
			transaction,
			self.consensus.max_block_size,
			self.consensus.max_block_sigops,
		).check()?;

		let buffer = self.buffer.lock();

		// known transactions are not accepted twice
		if buffer.iter().any(|entry| entry.hash == transaction.hash) {
			return Err(Error::Duplicate);
		}
		if self.store.transaction_meta(&transaction.hash).is_some() {
			return Err(Error::Duplicate);
		}

		// an output consumed by the chain or by another pooled transaction
		// is off limits
		for input in &transaction.raw.inputs {
			let spent_in_pool = buffer.iter().any(|entry| entry.transaction.raw.inputs.iter()
				.any(|pool_input| pool_input.previous_output == input.previous_output));
			if spent_in_pool {
				return Err(Error::DoubleSpend);
			}
			if self.store.is_spent(&input.previous_output) {
				return Err(Error::DoubleSpend);
			}
		}

		let next_height = self.store.best_block().map(|best| best.number + 1).unwrap_or(0);
		let context_header = self.context_header();

		let mut unconfirmed = Vec::new();
		let mut incoming: u64 = 0;

		for (index, input) in transaction.raw.inputs.iter().enumerate() {
			let prevout = &input.previous_output;
			let output = match self.store.transaction_meta(&prevout.hash) {
				Some(meta) => {
					if meta.is_coinbase() &&
						next_height < meta.height() + self.consensus.coinbase_maturity {
						return Err(Error::ValidateInputsFailed(index));
					}
					self.store.transaction(&prevout.hash)
						.and_then(|tx| tx.raw.outputs.get(prevout.index as usize).cloned())
						.ok_or(Error::InputNotFound(index))?
				},
				None => {
					// fall back to the pool; such inputs are reported back
					// as unconfirmed
					let entry = buffer.iter().find(|entry| entry.hash == prevout.hash)
						.ok_or(Error::InputNotFound(index))?;
					let output = entry.transaction.raw.outputs.get(prevout.index as usize)
						.cloned()
						.ok_or(Error::InputNotFound(index))?;
					unconfirmed.push(index);
					output
				},
			};

			if output.value > MAX_MONEY {
				return Err(Error::ValidateInputsFailed(index));
			}
			incoming = incoming.checked_add(output.value)
				.ok_or(Error::ValidateInputsFailed(index))?;

			if !self.oracle.validate_consensus(
				&output.script_pubkey,
				&transaction.raw,
				index,
				&context_header,
				next_height,
			) {
				return Err(Error::ValidateInputsFailed(index));
			}
		}

		// the transaction has to pay for itself
		if transaction.raw.total_spends() > incoming {
			return Err(Error::Transaction(::verification::TransactionError::Overspend));
		}

		Ok(unconfirmed)
	}

	fn do_store(&self, transaction: IndexedTransaction, on_confirm: ConfirmHandler, on_validate: ValidateHandler) {
		match self.do_validate(&transaction) {
			Ok(unconfirmed) => {
				let mut buffer = self.buffer.lock();
				if buffer.len() >= self.capacity {
					if let Some(evicted) = buffer.pop_front() {
						(evicted.on_confirm)(Err(Error::PoolFilled));
					}
				}

				buffer.push_back(MempoolEntry {
					hash: transaction.hash.clone(),
					transaction: transaction,
					on_confirm: on_confirm,
				});
				debug!(target: "mempool", "Transaction saved to mempool ({})", buffer.len());
				on_validate(Ok(unconfirmed));
			},
			Err(error) => {
				on_validate(Err(error));
			},
		}
	}

	fn do_fetch(&self, hash: &H256) -> Result<IndexedTransaction, Error> {
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		self.buffer.lock().iter()
			.find(|entry| entry.hash == *hash)
			.map(|entry| entry.transaction.clone())
			.ok_or(Error::NotFound)
	}

	fn do_exists(&self, hash: &H256) -> Result<bool, Error> {
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		Ok(self.buffer.lock().iter().any(|entry| entry.hash == *hash))
	}

	fn on_reorganize(&self, incoming: BlockList, outgoing: BlockList) {
		if self.stop.is_stopped() {
			return;
		}

		debug!(
			target: "mempool",
			"Reorganize: pool size ({}) new blocks ({}) replaced blocks ({})",
			self.buffer.lock().len(),
			incoming.len(),
			outgoing.len()
		);

		if outgoing.is_empty() {
			self.remove_confirmed(&incoming);
		} else {
			self.invalidate();
		}
	}

	/// A pure chain extension confirms pooled transactions.
	fn remove_confirmed(&self, blocks: &BlockList) {
		let mut buffer = self.buffer.lock();
		if buffer.is_empty() {
			return;
		}

		for block in blocks.iter() {
			for tx in &block.transactions {
				let position = buffer.iter().position(|entry| entry.hash == tx.hash);
				if let Some(position) = position {
					let entry = buffer.remove(position).expect("position returned by iter().position; qed");
					(entry.on_confirm)(Ok(()));
				}
			}
		}
	}

	/// Any unwound block invalidates the whole pool. Coarse, and by design:
	/// see http://www.jwz.org/doc/worse-is-better.html
	fn invalidate(&self) {
		let mut buffer = self.buffer.lock();
		for entry in buffer.drain(..) {
			(entry.on_confirm)(Err(Error::BlockchainReorganized));
		}
	}

	fn context_header(&self) -> BlockHeader {
		self.store.best_block()
			.and_then(|best| self.store.as_block_header_provider().block_header(best.hash.into()))
			.map(|header| header.raw)
			.unwrap_or_else(|| BlockHeader {
				version: 1,
				previous_header_hash: H256::default(),
				merkle_root_hash: H256::default(),
				time: 0,
				bits: 0u32.into(),
				nonce: 0,
			})
	}
}
