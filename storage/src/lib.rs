extern crate chain;
extern crate primitives;

mod best_block;
mod block_chain;
mod block_impls;
mod block_provider;
mod block_ref;
mod duplex_store;
mod error;
mod store;
mod transaction_meta;
mod transaction_provider;

pub use primitives::{hash, bytes};

pub use best_block::BestBlock;
pub use block_chain::BlockChain;
pub use block_provider::{BlockHeaderProvider, BlockProvider};
pub use block_ref::BlockRef;
pub use duplex_store::{DuplexTransactionOutputProvider, NoopStore};
pub use error::Error;
pub use store::{AsSubstore, Store, SharedStore};
pub use transaction_meta::TransactionMeta;
pub use transaction_provider::{TransactionProvider, TransactionOutputProvider, TransactionMetaProvider};
