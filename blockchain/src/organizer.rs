use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use time::get_time;
use primitives::hash::H256;
use primitives::bigint::U256;
use chain::IndexedBlock;
use network::ConsensusParams;
use dispatcher::{Dispatcher, OrderedQueue, StopSignal};
use storage::{BlockChain, BlockProvider, BlockHeaderProvider, SharedStore, Store};
use verification::{block_proof, BlockAcceptor, BlockConnector, BlockVerifier, CanonBlock, ConsensusOracle, Error};
use orphan_pool::OrphanPool;
use header_branch::HeaderBranch;
use populate_block::populate_block;
use populate_chain_state::ChainStatePopulator;

/// Blocks delivered with a reorganization notification.
pub type BlockList = Arc<Vec<IndexedBlock>>;

/// Completion handler of a single organize request.
pub type OrganizeHandler = Box<FnOnce(Result<(), Error>) + Send>;

/// One-shot subscriber to reorganization events. Receives the fork point
/// height, the attached blocks and the detached blocks; must re-subscribe to
/// hear about the next event.
pub type ReorganizeHandler = Box<FnOnce(Result<(), Error>, u32, BlockList, BlockList) + Send>;

/// The single writer to the stored chain.
///
/// Intake is serialized through an ordered dispatcher queue, so at most one
/// reorganization is in flight at any time and no two block connections
/// overlap.
pub struct BlockOrganizer {
	shared: Arc<OrganizerShared>,
	queue: OrderedQueue,
}

struct OrganizerShared {
	store: SharedStore,
	consensus: ConsensusParams,
	oracle: Arc<ConsensusOracle>,
	dispatcher: Arc<Dispatcher>,
	pool: Mutex<OrphanPool>,
	subscribers: Mutex<Vec<ReorganizeHandler>>,
	stop: StopSignal,
	started: AtomicBool,
}

impl BlockOrganizer {
	pub fn new(
		store: SharedStore,
		consensus: ConsensusParams,
		oracle: Arc<ConsensusOracle>,
		dispatcher: Arc<Dispatcher>,
		orphan_capacity: usize,
	) -> Self {
		let queue = dispatcher.ordered();
		BlockOrganizer {
			shared: Arc::new(OrganizerShared {
				store: store,
				consensus: consensus,
				oracle: oracle,
				dispatcher: dispatcher,
				pool: Mutex::new(OrphanPool::new(orphan_capacity)),
				subscribers: Mutex::new(Vec::new()),
				stop: StopSignal::new(),
				started: AtomicBool::new(false),
			}),
			queue: queue,
		}
	}

	pub fn start(&self) {
		self.shared.stop.reset();
		self.shared.started.store(true, Ordering::SeqCst);
	}

	/// Stops intake and tells the subscribers the service is gone. Work
	/// already queued short-circuits at the next stage boundary.
	pub fn stop(&self) {
		if !self.shared.started.swap(false, Ordering::SeqCst) {
			return;
		}
		self.shared.stop.stop();
		self.shared.notify_stopped();
	}

	pub fn subscribe_reorganize(&self, handler: ReorganizeHandler) {
		self.shared.subscribers.lock().push(handler);
	}

	/// Schedules a candidate block. The handler fires once with the intake
	/// verdict; chain progress itself is announced via the reorganize
	/// subscription.
	pub fn organize(&self, block: IndexedBlock, handler: OrganizeHandler) {
		if !self.shared.started.load(Ordering::SeqCst) || self.shared.stop.is_stopped() {
			handler(Err(Error::ServiceStopped));
			return;
		}

		let shared = self.shared.clone();
		self.queue.push(move || {
			let result = shared.organize_block(block);
			if let Err(Error::Database(_)) = result {
				// a database failure is fatal: stop the service and let the
				// subscribers know
				warn!(target: "chain", "Stopping block organizer on database error");
				shared.started.store(false, Ordering::SeqCst);
				shared.stop.stop();
				shared.notify_stopped();
			}
			handler(result);
		});
	}
}

impl OrganizerShared {
	fn organize_block(&self, block: IndexedBlock) -> Result<(), Error> {
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		let hash = block.header.hash.clone();
		if self.store.as_block_provider().contains_block(&hash) || self.pool.lock().contains(&hash) {
			return Err(Error::Duplicate);
		}

		// phase 1: context-free checks, before the block is even parked
		let now = get_time().sec as u32;
		BlockVerifier::new(&block, &self.consensus, now, &self.stop).check()?;

		self.pool.lock().insert(block);

		// out-of-order arrivals: walk forward while pooled children exist
		let mut tip = hash.clone();
		loop {
			let child = self.pool.lock().first_child(&tip);
			match child {
				Some(child) => tip = child,
				None => break,
			}
		}

		// walk the pool back to the stored chain
		let (chain, root_parent) = {
			let pool = self.pool.lock();
			let hashes = pool.chain_to(&tip);
			let chain: Vec<IndexedBlock> = hashes.iter()
				.map(|hash| pool.get(hash).cloned().expect("chain_to returns pooled hashes; qed"))
				.collect();
			let root_parent = chain.first()
				.expect("the block just inserted is part of the chain; qed")
				.header.raw.previous_header_hash.clone();
			(chain, root_parent)
		};

		let fork = match self.store.as_block_header_provider().block_number(&root_parent) {
			Some(number) => Some(number),
			None if root_parent.is_zero() && self.store.best_block().is_none() => None,
			None => {
				// parent is still unknown: stays parked in the orphan pool
				trace!(target: "chain", "Parked orphan block {}", hash.to_reversed_str());
				return Ok(());
			},
		};

		// phase 2: only a heavier branch is worth validating
		let first_height = fork.map(|f| f + 1).unwrap_or(0);
		let orphan_work = chain.iter()
			.fold(U256::zero(), |sum, block| sum + block_proof(block.header.raw.bits));
		let main_work = self.stored_work_above(first_height)?;

		if orphan_work <= main_work {
			trace!(target: "chain", "Retaining side chain block {}", hash.to_reversed_str());
			return Ok(());
		}

		// phase 3: accept + connect every branch block, parent first
		for (index, candidate) in chain.iter().enumerate() {
			if self.stop.is_stopped() {
				return Err(Error::ServiceStopped);
			}

			let height = first_height + index as u32;
			if let Err(error) = self.validate_candidate(candidate, height, fork, &chain[..index]) {
				if error != Error::ServiceStopped {
					warn!(
						target: "chain",
						"Invalid block {}: {:?}",
						candidate.header.hash.to_reversed_str(),
						error
					);
					// evict the bad block together with everything built on it
					self.pool.lock().remove_subtree(&candidate.header.hash);
				}
				return Err(error);
			}
		}

		// phase 4: atomic switch; nothing may be committed if we are asked
		// to stop at this point
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		let outgoing = self.blocks_above(first_height)?;
		let outgoing_hashes: Vec<H256> = outgoing.iter().rev()
			.map(|block| block.header.hash.clone())
			.collect();

		self.store.reorganize(fork, &chain, &outgoing_hashes)?;

		{
			let mut pool = self.pool.lock();
			for block in &chain {
				pool.remove(&block.header.hash);
			}
			// the replaced branch stays switchable
			for block in outgoing.iter().cloned() {
				pool.insert(block);
			}
		}

		let fork_point = fork.unwrap_or(0);
		info!(
			target: "chain",
			"Reorganized chain at fork {}: {} blocks in, {} blocks out",
			fork_point,
			chain.len(),
			outgoing.len()
		);
		self.notify_reorganize(fork_point, Arc::new(chain), Arc::new(outgoing));

		Ok(())
	}

	fn validate_candidate(
		&self,
		candidate: &IndexedBlock,
		height: u32,
		fork: Option<u32>,
		branch: &[IndexedBlock],
	) -> Result<(), Error> {
		let header_branch = HeaderBranch::new(fork, branch);
		let state = ChainStatePopulator::new(self.store.as_block_header_provider(), &self.consensus)
			.populate(&candidate.header, height, &header_branch)?;

		BlockAcceptor::new(CanonBlock::new(candidate), &self.consensus, &state, &self.stop).check()?;

		let populated = populate_block(
			self.store.clone(),
			&self.consensus,
			&self.dispatcher,
			candidate,
			fork,
			branch,
		)?;

		BlockConnector::new(
			CanonBlock::new(candidate),
			&self.consensus,
			&state,
			&populated,
			&populated,
			&*self.oracle,
			&self.stop,
		).check()
	}

	fn stored_work_above(&self, first_height: u32) -> Result<U256, Error> {
		let best = match self.store.best_block() {
			Some(best) => best,
			None => return Ok(U256::zero()),
		};

		let mut work = U256::zero();
		let mut height = first_height;
		while height <= best.number {
			let header = self.store.as_block_header_provider()
				.block_header(height.into())
				.ok_or(Error::OperationFailed)?;
			work = work + block_proof(header.raw.bits);
			height += 1;
		}
		Ok(work)
	}

	fn blocks_above(&self, first_height: u32) -> Result<Vec<IndexedBlock>, Error> {
		let best = match self.store.best_block() {
			Some(best) => best,
			None => return Ok(Vec::new()),
		};

		let mut blocks = Vec::new();
		let mut height = first_height;
		while height <= best.number {
			let block = self.store.as_block_provider()
				.block(height.into())
				.ok_or(Error::OperationFailed)?;
			blocks.push(block);
			height += 1;
		}
		Ok(blocks)
	}

	fn notify_reorganize(&self, fork_point: u32, incoming: BlockList, outgoing: BlockList) {
		let subscribers = mem::replace(&mut *self.subscribers.lock(), Vec::new());
		for subscriber in subscribers {
			subscriber(Ok(()), fork_point, incoming.clone(), outgoing.clone());
		}
	}

	fn notify_stopped(&self) {
		let subscribers = mem::replace(&mut *self.subscribers.lock(), Vec::new());
		let empty: BlockList = Arc::new(Vec::new());
		for subscriber in subscribers {
			subscriber(Err(Error::ServiceStopped), 0, empty.clone(), empty.clone());
		}
	}
}
