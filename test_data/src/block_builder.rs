//! Fluent builders for test blocks and transactions.
//!
//! Defaults are chosen so that a builder-made chain passes Unitest consensus
//! checks: header bits default to the Unitest maximum target. Timestamps
//! default to zero and must be raised by the caller when median-time-past
//! matters.

use chain::{Block, BlockHeader, Transaction, TransactionInput, TransactionOutput, OutPoint, merkle_root};
use chain::constants::SEQUENCE_FINAL;
use network::Network;
use primitives::bytes::Bytes;
use primitives::compact::Compact;
use primitives::hash::H256;
use invoke::{Invoke, Identity};

pub struct BlockBuilder {
	header: Option<BlockHeader>,
	transactions: Vec<Transaction>,
}

impl BlockBuilder {
	pub fn new() -> Self {
		BlockBuilder {
			header: None,
			transactions: Vec::new(),
		}
	}

	pub fn header(self) -> BlockHeaderBuilder<Self> {
		BlockHeaderBuilder::with_callback(self)
	}

	/// Header builder with the merkle root precomputed from the transactions
	/// pushed so far.
	pub fn merkled_header(self) -> BlockHeaderBuilder<Self> {
		let hashes = self.transactions.iter().map(Transaction::hash).collect::<Vec<H256>>();
		let builder = self.header();
		match hashes.len() {
			0 => builder,
			_ => builder.merkle_root(merkle_root(&hashes)),
		}
	}

	pub fn transaction(self) -> TransactionBuilder<Self> {
		TransactionBuilder::with_callback(self)
	}

	pub fn with_transaction(mut self, transaction: Transaction) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn with_header(mut self, header: BlockHeader) -> Self {
		self.header = Some(header);
		self
	}

	pub fn build(self) -> Block {
		Block::new(
			self.header.expect("header is built before the block; qed"),
			self.transactions,
		)
	}
}

impl Invoke<BlockHeader> for BlockBuilder {
	type Result = Self;

	fn invoke(self, header: BlockHeader) -> Self {
		self.with_header(header)
	}
}

impl Invoke<Transaction> for BlockBuilder {
	type Result = Self;

	fn invoke(self, tx: Transaction) -> Self {
		self.with_transaction(tx)
	}
}

pub struct BlockHeaderBuilder<F = Identity> {
	callback: F,
	version: u32,
	parent: H256,
	merkle_root: H256,
	time: u32,
	bits: Compact,
	nonce: u32,
}

impl<F> BlockHeaderBuilder<F> where F: Invoke<BlockHeader> {
	pub fn with_callback(callback: F) -> Self {
		BlockHeaderBuilder {
			callback: callback,
			version: 1,
			parent: H256::default(),
			merkle_root: H256::default(),
			time: 0,
			bits: Compact::from_u256(Network::Unitest.max_bits()),
			nonce: 0,
		}
	}

	pub fn version(mut self, version: u32) -> Self {
		self.version = version;
		self
	}

	pub fn parent(mut self, parent: H256) -> Self {
		self.parent = parent;
		self
	}

	pub fn merkle_root(mut self, merkle_root: H256) -> Self {
		self.merkle_root = merkle_root;
		self
	}

	pub fn time(mut self, time: u32) -> Self {
		self.time = time;
		self
	}

	pub fn bits(mut self, bits: Compact) -> Self {
		self.bits = bits;
		self
	}

	pub fn nonce(mut self, nonce: u32) -> Self {
		self.nonce = nonce;
		self
	}

	pub fn build(self) -> F::Result {
		self.callback.invoke(BlockHeader {
			version: self.version,
			previous_header_hash: self.parent,
			merkle_root_hash: self.merkle_root,
			time: self.time,
			bits: self.bits,
			nonce: self.nonce,
		})
	}
}

pub struct TransactionBuilder<F = Identity> {
	callback: F,
	version: i32,
	lock_time: u32,
	inputs: Vec<TransactionInput>,
	outputs: Vec<TransactionOutput>,
}

impl<F> TransactionBuilder<F> where F: Invoke<Transaction> {
	pub fn with_callback(callback: F) -> Self {
		TransactionBuilder {
			callback: callback,
			version: 1,
			lock_time: 0,
			inputs: Vec::new(),
			outputs: Vec::new(),
		}
	}

	pub fn version(mut self, version: i32) -> Self {
		self.version = version;
		self
	}

	pub fn lock_time(mut self, lock_time: u32) -> Self {
		self.lock_time = lock_time;
		self
	}

	/// Adds a coinbase input. The script doubles as the uniqueness nonce of
	/// the transaction, so callers building chains should vary it per block.
	pub fn coinbase(mut self, script_sig: Bytes) -> Self {
		self.inputs.push(TransactionInput::coinbase(script_sig));
		self
	}

	pub fn input(self) -> TransactionInputBuilder<Self> {
		TransactionInputBuilder::with_callback(self)
	}

	pub fn with_input(mut self, input: TransactionInput) -> Self {
		self.inputs.push(input);
		self
	}

	pub fn output(self) -> TransactionOutputBuilder<Self> {
		TransactionOutputBuilder::with_callback(self)
	}

	pub fn with_output(mut self, output: TransactionOutput) -> Self {
		self.outputs.push(output);
		self
	}

	pub fn build(self) -> F::Result {
		self.callback.invoke(Transaction {
			version: self.version,
			inputs: self.inputs,
			outputs: self.outputs,
			lock_time: self.lock_time,
		})
	}
}

impl<F> Invoke<TransactionInput> for TransactionBuilder<F> where F: Invoke<Transaction> {
	type Result = Self;

	fn invoke(self, input: TransactionInput) -> Self {
		self.with_input(input)
	}
}

impl<F> Invoke<TransactionOutput> for TransactionBuilder<F> where F: Invoke<Transaction> {
	type Result = Self;

	fn invoke(self, output: TransactionOutput) -> Self {
		self.with_output(output)
	}
}

pub struct TransactionInputBuilder<F = Identity> {
	callback: F,
	hash: H256,
	index: u32,
	script_sig: Bytes,
	sequence: u32,
}

impl<F> TransactionInputBuilder<F> where F: Invoke<TransactionInput> {
	pub fn with_callback(callback: F) -> Self {
		TransactionInputBuilder {
			callback: callback,
			hash: H256::default(),
			index: 0,
			script_sig: Bytes::default(),
			sequence: SEQUENCE_FINAL,
		}
	}

	pub fn hash(mut self, hash: H256) -> Self {
		self.hash = hash;
		self
	}

	pub fn index(mut self, index: u32) -> Self {
		self.index = index;
		self
	}

	pub fn script_sig(mut self, script_sig: Bytes) -> Self {
		self.script_sig = script_sig;
		self
	}

	pub fn sequence(mut self, sequence: u32) -> Self {
		self.sequence = sequence;
		self
	}

	pub fn build(self) -> F::Result {
		self.callback.invoke(TransactionInput {
			previous_output: OutPoint {
				hash: self.hash,
				index: self.index,
			},
			script_sig: self.script_sig,
			sequence: self.sequence,
		})
	}
}

pub struct TransactionOutputBuilder<F = Identity> {
	callback: F,
	value: u64,
	script_pubkey: Bytes,
}

impl<F> TransactionOutputBuilder<F> where F: Invoke<TransactionOutput> {
	pub fn with_callback(callback: F) -> Self {
		TransactionOutputBuilder {
			callback: callback,
			value: 0,
			script_pubkey: Bytes::default(),
		}
	}

	pub fn value(mut self, value: u64) -> Self {
		self.value = value;
		self
	}

	pub fn script_pubkey(mut self, script_pubkey: Bytes) -> Self {
		self.script_pubkey = script_pubkey;
		self
	}

	pub fn build(self) -> F::Result {
		self.callback.invoke(TransactionOutput {
			value: self.value,
			script_pubkey: self.script_pubkey,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::super::block_builder;

	#[test]
	fn example_block() {
		let block = block_builder()
			.transaction()
				.coinbase("0000".into())
				.output().value(50).build()
				.build()
			.merkled_header()
				.time(1000)
				.build()
			.build();

		assert_eq!(block.transactions.len(), 1);
		assert!(block.transactions[0].is_coinbase());
		assert_eq!(block.merkle_root(), block.block_header.merkle_root_hash);
	}
}
