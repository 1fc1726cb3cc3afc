use chain::{IndexedBlock, OutPoint, TransactionOutput};
use TransactionOutputProvider;

/// Lets a block act as the source of its own previous outputs: an input of
/// transaction `n` may reference an output created by an earlier transaction
/// of the same block.
impl TransactionOutputProvider for IndexedBlock {
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<TransactionOutput> {
		self.transactions.iter()
			.take(transaction_index)
			.find(|tx| tx.hash == outpoint.hash)
			.and_then(|tx| tx.raw.outputs.get(outpoint.index as usize))
			.cloned()
	}

	fn is_spent(&self, _outpoint: &OutPoint) -> bool {
		// intra-block double spends are caught by the connector's
		// duplicate-outpoint pass
		false
	}
}

#[cfg(test)]
mod tests {
	use chain::{Block, IndexedBlock, OutPoint, Transaction, TransactionInput, TransactionOutput, BlockHeader};
	use TransactionOutputProvider;

	fn test_block() -> IndexedBlock {
		let tx0 = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase("00".into())],
			outputs: vec![TransactionOutput { value: 10, script_pubkey: Default::default() }],
			lock_time: 0,
		};
		let tx1 = Transaction {
			version: 1,
			inputs: vec![TransactionInput {
				previous_output: OutPoint { hash: tx0.hash(), index: 0 },
				script_sig: Default::default(),
				sequence: 0xffffffff,
			}],
			outputs: vec![TransactionOutput { value: 10, script_pubkey: Default::default() }],
			lock_time: 0,
		};
		let header = BlockHeader {
			version: 1,
			previous_header_hash: Default::default(),
			merkle_root_hash: Default::default(),
			time: 0,
			bits: 0u32.into(),
			nonce: 0,
		};
		Block::new(header, vec![tx0, tx1]).into()
	}

	#[test]
	fn test_block_transaction_output_lookup() {
		let block = test_block();
		let coinbase_hash = block.transactions[0].hash.clone();
		let outpoint = OutPoint { hash: coinbase_hash, index: 0 };

		// transaction 1 sees the output of transaction 0
		assert!(block.transaction_output(&outpoint, 1).is_some());
		// transaction 0 does not see its own output
		assert!(block.transaction_output(&outpoint, 0).is_none());
	}
}
