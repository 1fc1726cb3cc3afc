use hash::H256;
use chain::{IndexedTransaction, OutPoint, TransactionOutput};
use TransactionMeta;

pub trait TransactionProvider: Send + Sync {
	/// resolves transaction body by transaction id
	fn transaction(&self, hash: &H256) -> Option<IndexedTransaction>;
}

/// During transaction the only part of old transaction that we need is `TransactionOutput`.
/// Structures like `IndexedBlock` already have it in memory, so it would be
/// a shame to clone the whole transaction just to check its output.
pub trait TransactionOutputProvider: Send + Sync {
	/// Returns the output of the given transaction, if it was created before
	/// the transaction at `transaction_index`.
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<TransactionOutput>;

	/// Returns true if the output is known to be spent.
	fn is_spent(&self, outpoint: &OutPoint) -> bool;
}

pub trait TransactionMetaProvider: Send + Sync {
	/// Returns the metadata of the transaction with the given hash.
	fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta>;
}
