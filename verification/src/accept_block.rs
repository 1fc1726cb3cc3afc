use network::ConsensusParams;
use dispatcher::StopSignal;
use script::{Builder, Num};
use canon::CanonBlock;
use chain_state::ChainState;
use work::work_required;
use error::Error;

/// Contextual validation of an ordered block.
///
/// Everything here is answered from the populated chain state; no database
/// access happens during the check.
pub struct BlockAcceptor<'a> {
	pub work: BlockWork<'a>,
	pub median_timestamp: BlockMedianTimestamp<'a>,
	pub finality: BlockFinality<'a>,
	pub checkpoint: BlockCheckpoint<'a>,
	pub version: BlockVersion<'a>,
	pub coinbase_script: BlockCoinbaseScript<'a>,
	stop: &'a StopSignal,
}

impl<'a> BlockAcceptor<'a> {
	pub fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState, stop: &'a StopSignal) -> Self {
		trace!(target: "verification", "Block verification {}", block.hash().to_reversed_str());
		BlockAcceptor {
			work: BlockWork::new(block, consensus, state),
			median_timestamp: BlockMedianTimestamp::new(block, state),
			finality: BlockFinality::new(block, consensus, state),
			checkpoint: BlockCheckpoint::new(block, consensus, state),
			version: BlockVersion::new(block, consensus, state),
			coinbase_script: BlockCoinbaseScript::new(block, consensus, state),
			stop: stop,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.work.check()?;
		self.median_timestamp.check()?;
		if self.stop.is_stopped() {
			return Err(Error::ServiceStopped);
		}
		self.finality.check()?;
		self.checkpoint.check()?;
		self.version.check()?;
		self.coinbase_script.check()?;
		Ok(())
	}
}

pub struct BlockWork<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
}

impl<'a> BlockWork<'a> {
	fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState) -> Self {
		BlockWork {
			block: block,
			consensus: consensus,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let expected = work_required(self.state, self.consensus);
		let actual = self.block.header.raw.bits;
		if actual == expected {
			Ok(())
		} else {
			Err(Error::Difficulty { expected: expected, actual: actual })
		}
	}
}

pub struct BlockMedianTimestamp<'a> {
	block: CanonBlock<'a>,
	state: &'a ChainState,
}

impl<'a> BlockMedianTimestamp<'a> {
	fn new(block: CanonBlock<'a>, state: &'a ChainState) -> Self {
		BlockMedianTimestamp {
			block: block,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		// genesis has no ancestors to take a median of
		if self.state.ordered_timestamps.is_empty() {
			return Ok(());
		}

		if self.block.header.raw.time <= self.state.median_time_past() {
			Err(Error::Timestamp)
		} else {
			Ok(())
		}
	}
}

pub struct BlockFinality<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
}

impl<'a> BlockFinality<'a> {
	fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState) -> Self {
		BlockFinality {
			block: block,
			consensus: consensus,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let time_cutoff = self.state.finality_time_cutoff(self.consensus);
		if self.block.transactions().iter().all(|tx| tx.raw.is_final_in_block(self.state.height, time_cutoff)) {
			Ok(())
		} else {
			Err(Error::NonFinalBlock)
		}
	}
}

pub struct BlockCheckpoint<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
}

impl<'a> BlockCheckpoint<'a> {
	fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState) -> Self {
		BlockCheckpoint {
			block: block,
			consensus: consensus,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		match self.consensus.checkpoint(self.state.height) {
			Some(expected) if expected == self.block.hash() => Ok(()),
			Some(_) => Err(Error::Checkpoint),
			None => Ok(()),
		}
	}
}

pub struct BlockVersion<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
}

impl<'a> BlockVersion<'a> {
	fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState) -> Self {
		BlockVersion {
			block: block,
			consensus: consensus,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.version < self.state.minimum_block_version(self.consensus) {
			Err(Error::OldVersionBlock)
		} else {
			Ok(())
		}
	}
}

pub struct BlockCoinbaseScript<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
}

impl<'a> BlockCoinbaseScript<'a> {
	fn new(block: CanonBlock<'a>, consensus: &'a ConsensusParams, state: &'a ChainState) -> Self {
		BlockCoinbaseScript {
			block: block,
			consensus: consensus,
			state: state,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.version < 2 || !self.state.is_bip34_active(self.consensus) {
			return Ok(());
		}

		let prefix = Builder::default()
			.push_num(Num::from(self.state.height))
			.into_script();

		let matches = self.block.transactions().first()
			.and_then(|tx| tx.raw.inputs.first())
			.map(|input| input.script_sig.starts_with(&prefix))
			.unwrap_or(false);

		if matches {
			Ok(())
		} else {
			Err(Error::CoinbaseScript)
		}
	}
}

#[cfg(test)]
mod tests {
	use chain::IndexedBlock;
	use network::{ConsensusParams, Network};
	use dispatcher::StopSignal;
	use script::{Builder, Num};
	use test_data;
	use canon::CanonBlock;
	use chain_state::ChainState;
	use error::Error;
	use super::BlockAcceptor;

	fn consensus() -> ConsensusParams {
		ConsensusParams::new(Network::Unitest)
	}

	fn state_for(block: &IndexedBlock, height: u32, timestamps: Vec<u32>) -> ChainState {
		let consensus = consensus();
		ChainState {
			height: height,
			hash: block.header.hash.clone(),
			version: block.header.raw.version,
			time: block.header.raw.time,
			bits: block.header.raw.bits,
			ordered_bits: match height {
				0 => Vec::new(),
				_ => vec![::primitives::compact::Compact::from_u256(consensus.network.max_bits())],
			},
			ordered_versions: Vec::new(),
			ordered_timestamps: timestamps,
			retarget_timestamp: None,
			collision_hash: None,
		}
	}

	fn accept(block: &IndexedBlock, state: &ChainState, consensus: &ConsensusParams) -> Result<(), Error> {
		let stop = StopSignal::new();
		BlockAcceptor::new(CanonBlock::new(block), consensus, state, &stop).check()
	}

	fn block_at_time(time: u32) -> IndexedBlock {
		test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(time).build()
			.build()
			.into()
	}

	#[test]
	fn accept_block_valid() {
		let consensus = consensus();
		let block = block_at_time(100);
		let state = state_for(&block, 1, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Ok(()));
	}

	#[test]
	fn accept_block_wrong_bits() {
		let consensus = consensus();
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(100).bits(0x1d00ffffu32.into()).build()
			.build()
			.into();
		let state = state_for(&block, 1, vec![50]);
		match accept(&block, &state, &consensus) {
			Err(Error::Difficulty { .. }) => (),
			other => panic!("expected difficulty error, got {:?}", other),
		}
	}

	#[test]
	fn accept_block_timestamp_not_after_median() {
		let consensus = consensus();
		let block = block_at_time(100);

		// median of [98, 99, 100] is 99 < 100: fine
		let state = state_for(&block, 3, vec![98, 99, 100]);
		assert_eq!(accept(&block, &state, &consensus), Ok(()));

		// median of [100, 101, 102] is 101 >= 100: too early
		let state = state_for(&block, 3, vec![100, 101, 102]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::Timestamp));

		// equality is also too early
		let state = state_for(&block, 3, vec![99, 100, 101]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::Timestamp));
	}

	#[test]
	fn accept_block_non_final_transaction() {
		let consensus = consensus();
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.transaction()
				.lock_time(1000)
				.input().hash(1u8.into()).sequence(0).build()
				.output().value(10).build()
				.build()
			.merkled_header().time(100).build()
			.build()
			.into();

		// lock_time 1000 is a height bound; at height 5 the tx is not final
		let state = state_for(&block, 5, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::NonFinalBlock));

		// at height 1001 it is
		let state = state_for(&block, 1001, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Ok(()));
	}

	#[test]
	fn accept_block_checkpoint_mismatch() {
		let mut consensus = consensus();
		let block = block_at_time(100);
		consensus.checkpoints.push((1, 9u8.into()));

		let state = state_for(&block, 1, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::Checkpoint));

		// agreeing checkpoint passes
		consensus.checkpoints[0].1 = block.header.hash.clone();
		assert_eq!(accept(&block, &state, &consensus), Ok(()));
	}

	#[test]
	fn accept_block_old_version() {
		let mut consensus = consensus();
		consensus.bip34_height = 10;
		let block = block_at_time(100);

		// v1 block is fine below the threshold
		let state = state_for(&block, 10, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Ok(()));

		// and rejected above it
		let state = state_for(&block, 11, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::OldVersionBlock));
	}

	#[test]
	fn accept_block_coinbase_height() {
		let mut consensus = consensus();
		consensus.bip34_height = 10;
		let height = 461373;

		let correct_prefix = Builder::default().push_num(Num::from(height)).into_bytes();
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase(correct_prefix)
				.output().value(50).build()
				.build()
			.merkled_header().time(100).version(2).build()
			.build()
			.into();
		let state = state_for(&block, height, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Ok(()));

		// a v2 coinbase with the wrong height embedded is rejected
		let wrong_prefix = Builder::default().push_num(Num::from(height - 1)).into_bytes();
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase(wrong_prefix)
				.output().value(50).build()
				.build()
			.merkled_header().time(100).version(2).build()
			.build()
			.into();
		let state = state_for(&block, height, vec![50]);
		assert_eq!(accept(&block, &state, &consensus), Err(Error::CoinbaseScript));
	}
}
