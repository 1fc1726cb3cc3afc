use std::sync::Arc;
use {
	BestBlock, BlockChain, BlockProvider, BlockHeaderProvider, TransactionProvider,
	TransactionMetaProvider, TransactionOutputProvider,
};

/// Blockchain storage interface
pub trait Store: AsSubstore {
	/// get best block; None while the chain is empty
	fn best_block(&self) -> Option<BestBlock>;

	/// is the best stored block older than the given limit
	fn is_blocks_stale(&self, limit_seconds: u32, now: u32) -> bool {
		match self.best_block().and_then(|best| self.block_header(best.hash.into())) {
			Some(header) => header.raw.time + limit_seconds < now,
			// an empty chain is by definition behind
			None => true,
		}
	}

	/// is the best stored header older than the given limit
	///
	/// Headers and blocks share a store here, so both queries agree.
	fn is_headers_stale(&self, limit_seconds: u32, now: u32) -> bool {
		self.is_blocks_stale(limit_seconds, now)
	}
}

/// Allows casting Arc<Store> to reference to any substore type
pub trait AsSubstore:
	BlockChain +
	BlockProvider +
	TransactionProvider +
	TransactionMetaProvider +
	TransactionOutputProvider
{
	fn as_block_provider(&self) -> &BlockProvider;

	fn as_block_header_provider(&self) -> &BlockHeaderProvider;

	fn as_transaction_provider(&self) -> &TransactionProvider;

	fn as_transaction_output_provider(&self) -> &TransactionOutputProvider;

	fn as_transaction_meta_provider(&self) -> &TransactionMetaProvider;
}

impl<T> AsSubstore for T
	where T: BlockChain +
		BlockProvider +
		TransactionProvider +
		TransactionMetaProvider +
		TransactionOutputProvider
{
	fn as_block_provider(&self) -> &BlockProvider {
		&*self
	}

	fn as_block_header_provider(&self) -> &BlockHeaderProvider {
		&*self
	}

	fn as_transaction_provider(&self) -> &TransactionProvider {
		&*self
	}

	fn as_transaction_output_provider(&self) -> &TransactionOutputProvider {
		&*self
	}

	fn as_transaction_meta_provider(&self) -> &TransactionMetaProvider {
		&*self
	}
}

pub type SharedStore = Arc<Store + Send + Sync>;
