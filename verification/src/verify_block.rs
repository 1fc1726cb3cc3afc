use primitives::bigint::U256;
use chain::IndexedBlock;
use network::ConsensusParams;
use dispatcher::StopSignal;
use storage::NoopStore;
use sigops::transaction_sigops;
use work::is_valid_proof_of_work;
use verify_transaction::TransactionVerifier;
use error::Error;

/// Context-free block verification: everything that can be checked before
/// the block is bound to a place in the chain.
pub struct BlockVerifier<'a> {
	pub empty: BlockEmpty<'a>,
	pub serialized_size: BlockSerializedSize<'a>,
	pub proof_of_work: BlockProofOfWork<'a>,
	pub timestamp: BlockTimestamp<'a>,
	pub coinbase: BlockCoinbase<'a>,
	pub extra_coinbases: BlockExtraCoinbases<'a>,
	pub transactions: Vec<TransactionVerifier<'a>>,
	pub duplicate_transactions: BlockDuplicateTransactions<'a>,
	pub sigops: BlockSigops<'a>,
	pub merkle_root: BlockMerkleRoot<'a>,
	stop: &'a StopSignal,
}

impl<'a> BlockVerifier<'a> {
	pub fn new(block: &'a IndexedBlock, consensus: &'a ConsensusParams, current_time: u32, stop: &'a StopSignal) -> Self {
		trace!(target: "verification", "Block pre-verification {}", block.hash().to_reversed_str());
		BlockVerifier {
			empty: BlockEmpty::new(block),
			serialized_size: BlockSerializedSize::new(block, consensus.max_block_size),
			proof_of_work: BlockProofOfWork::new(block, consensus.network.max_bits()),
			timestamp: BlockTimestamp::new(block, current_time, consensus.max_future_block_time),
			coinbase: BlockCoinbase::new(block),
			extra_coinbases: BlockExtraCoinbases::new(block),
			transactions: block.transactions.iter().map(TransactionVerifier::new).collect(),
			duplicate_transactions: BlockDuplicateTransactions::new(block),
			sigops: BlockSigops::new(block, consensus.max_block_sigops),
			merkle_root: BlockMerkleRoot::new(block),
			stop: stop,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.empty.check()?;
		self.serialized_size.check()?;
		self.proof_of_work.check()?;
		self.ensure_running()?;
		self.timestamp.check()?;
		self.coinbase.check()?;
		self.extra_coinbases.check()?;
		self.ensure_running()?;
		for (index, tx) in self.transactions.iter().enumerate() {
			tx.check().map_err(|err| Error::Transaction(index, err))?;
		}
		self.ensure_running()?;
		self.duplicate_transactions.check()?;
		self.sigops.check()?;
		self.ensure_running()?;
		self.merkle_root.check()?;
		Ok(())
	}

	fn ensure_running(&self) -> Result<(), Error> {
		if self.stop.is_stopped() {
			Err(Error::ServiceStopped)
		} else {
			Ok(())
		}
	}
}

pub struct BlockEmpty<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockEmpty<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockEmpty {
			block: block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.transactions.is_empty() {
			Err(Error::Empty)
		} else {
			Ok(())
		}
	}
}

pub struct BlockSerializedSize<'a> {
	block: &'a IndexedBlock,
	max_size: usize,
}

impl<'a> BlockSerializedSize<'a> {
	fn new(block: &'a IndexedBlock, max_size: usize) -> Self {
		BlockSerializedSize {
			block: block,
			max_size: max_size,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let size = self.block.size();
		if size > self.max_size {
			Err(Error::Size(size))
		} else {
			Ok(())
		}
	}
}

pub struct BlockProofOfWork<'a> {
	block: &'a IndexedBlock,
	maximum: U256,
}

impl<'a> BlockProofOfWork<'a> {
	fn new(block: &'a IndexedBlock, maximum: U256) -> Self {
		BlockProofOfWork {
			block: block,
			maximum: maximum,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if is_valid_proof_of_work(self.maximum.clone(), self.block.header.raw.bits, &self.block.header.hash) {
			Ok(())
		} else {
			Err(Error::Pow)
		}
	}
}

pub struct BlockTimestamp<'a> {
	block: &'a IndexedBlock,
	current_time: u32,
	max_future: u32,
}

impl<'a> BlockTimestamp<'a> {
	fn new(block: &'a IndexedBlock, current_time: u32, max_future: u32) -> Self {
		BlockTimestamp {
			block: block,
			current_time: current_time,
			max_future: max_future,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.time > self.current_time + self.max_future {
			Err(Error::FuturisticTimestamp)
		} else {
			Ok(())
		}
	}
}

pub struct BlockCoinbase<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockCoinbase<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockCoinbase {
			block: block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.transactions.first()
			.map(|tx| tx.raw.is_coinbase())
			.unwrap_or(false) {
			Ok(())
		} else {
			Err(Error::Coinbase)
		}
	}
}

pub struct BlockExtraCoinbases<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockExtraCoinbases<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockExtraCoinbases {
			block: block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let misplaced = self.block.transactions.iter()
			.skip(1)
			.position(|tx| tx.raw.is_coinbase());

		match misplaced {
			Some(_) => Err(Error::ExtraCoinbases),
			None => Ok(()),
		}
	}
}

pub struct BlockDuplicateTransactions<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockDuplicateTransactions<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockDuplicateTransactions {
			block: block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let mut hashes = self.block.transactions.iter()
			.map(|tx| &tx.hash)
			.collect::<Vec<_>>();
		hashes.sort();
		let original_len = hashes.len();
		hashes.dedup();

		if original_len == hashes.len() {
			Ok(())
		} else {
			Err(Error::DuplicatedTransactions)
		}
	}
}

/// Legacy signature-operation count of the whole block: no previous outputs
/// are available at this point, so P2SH redeem scripts are not included.
pub struct BlockSigops<'a> {
	block: &'a IndexedBlock,
	max_sigops: usize,
}

impl<'a> BlockSigops<'a> {
	fn new(block: &'a IndexedBlock, max_sigops: usize) -> Self {
		BlockSigops {
			block: block,
			max_sigops: max_sigops,
		}
	}

	fn check(&self) -> Result<(), Error> {
		let sigops = self.block.transactions.iter()
			.map(|tx| transaction_sigops(&tx.raw, &NoopStore, false))
			.fold(0usize, |acc, tx_sigops| acc.saturating_add(tx_sigops));

		if sigops > self.max_sigops {
			Err(Error::MaximumSigops)
		} else {
			Ok(())
		}
	}
}

pub struct BlockMerkleRoot<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockMerkleRoot<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockMerkleRoot {
			block: block,
		}
	}

	fn check(&self) -> Result<(), Error> {
		if self.block.merkle_root() == self.block.header.raw.merkle_root_hash {
			Ok(())
		} else {
			Err(Error::MerkleRoot)
		}
	}
}

#[cfg(test)]
mod tests {
	use chain::IndexedBlock;
	use network::{ConsensusParams, Network};
	use dispatcher::StopSignal;
	use script::Opcode;
	use test_data;
	use error::Error;
	use super::BlockVerifier;

	fn consensus() -> ConsensusParams {
		ConsensusParams::new(Network::Unitest)
	}

	fn check(block: &IndexedBlock, current_time: u32) -> Result<(), Error> {
		let consensus = consensus();
		let stop = StopSignal::new();
		BlockVerifier::new(block, &consensus, current_time, &stop).check()
	}

	fn valid_block(time: u32) -> IndexedBlock {
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
	fn verify_block_accepts_valid_block() {
		assert_eq!(check(&valid_block(1000), 1000), Ok(()));
	}

	#[test]
	fn verify_block_empty() {
		let block: IndexedBlock = test_data::block_builder()
			.merkled_header().build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::Empty));
	}

	#[test]
	fn verify_block_timestamp_boundary() {
		let consensus = consensus();
		// exactly two hours in the future is acceptable
		let block = valid_block(1000 + consensus.max_future_block_time);
		assert_eq!(check(&block, 1000), Ok(()));

		// one second more is not
		let block = valid_block(1000 + consensus.max_future_block_time + 1);
		assert_eq!(check(&block, 1000), Err(Error::FuturisticTimestamp));
	}

	#[test]
	fn verify_block_first_not_coinbase() {
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.input().hash(1u8.into()).build()
				.output().value(50).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::Coinbase));
	}

	#[test]
	fn verify_block_extra_coinbases() {
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.transaction()
				.coinbase("0001".into())
				.output().value(50).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::ExtraCoinbases));
	}

	#[test]
	fn verify_block_duplicated_transactions() {
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.transaction()
				.input().hash(1u8.into()).build()
				.output().value(10).build()
				.build()
			.transaction()
				.input().hash(1u8.into()).build()
				.output().value(10).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::DuplicatedTransactions));
	}

	#[test]
	fn verify_block_sigops_boundary() {
		// 20_000 sigops pass; the next one trips the limit
		let max_sigops_script: Vec<u8> = vec![Opcode::OP_CHECKSIG as u8; 20_000];
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).script_pubkey(max_sigops_script.clone().into()).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Ok(()));

		let mut script = max_sigops_script;
		script.push(Opcode::OP_CHECKSIG as u8);
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).script_pubkey(script.into()).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::MaximumSigops));
	}

	#[test]
	fn verify_block_merkle_mismatch() {
		let block: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.header().time(1000).merkle_root(7u8.into()).build()
			.build()
			.into();
		assert_eq!(check(&block, 1000), Err(Error::MerkleRoot));
	}

	#[test]
	fn verify_block_size_boundary() {
		let consensus = consensus();

		// measure a block with an empty padding output script, then regrow
		// the script so the whole block serializes to exactly the limit
		let template: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.output().value(0).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		// the padding script is longer than 0xffff, so its length prefix
		// takes 5 bytes instead of 1
		let padding = consensus.max_block_size - template.size() - 4;

		let at_limit: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.output().value(0).script_pubkey(vec![0u8; padding].into()).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(at_limit.size(), consensus.max_block_size);
		assert_eq!(check(&at_limit, 1000), Ok(()));

		let over_limit: IndexedBlock = test_data::block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.output().value(0).script_pubkey(vec![0u8; padding + 1].into()).build()
				.build()
			.merkled_header().time(1000).build()
			.build()
			.into();
		assert_eq!(over_limit.size(), consensus.max_block_size + 1);
		assert_eq!(
			check(&over_limit, 1000),
			Err(Error::Size(consensus.max_block_size + 1))
		);
	}

	#[test]
	fn verify_block_stopped() {
		let consensus = consensus();
		let stop = StopSignal::new();
		stop.stop();
		let block = valid_block(1000);
		assert_eq!(
			BlockVerifier::new(&block, &consensus, 1000, &stop).check(),
			Err(Error::ServiceStopped)
		);
	}
}
