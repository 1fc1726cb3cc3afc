//! Transaction memory pool.
//!
//! A bounded FIFO of validated unconfirmed transactions. Validation runs
//! against the current chain state plus the buffer itself, so a transaction
//! may spend outputs that are only in the pool; such inputs are reported
//! back as unconfirmed. The pool subscribes to chain reorganizations and
//! deliberately drops everything whenever a block is unwound.

#[macro_use]
extern crate log;
extern crate parking_lot;

extern crate blockchain;
extern crate chain;
extern crate dispatcher;
extern crate network;
extern crate primitives;
extern crate storage;
extern crate verification;

#[cfg(test)]
extern crate db;
#[cfg(test)]
extern crate test_data;

mod error;
mod transaction_pool;

pub use primitives::hash;

pub use error::Error;
pub use transaction_pool::{TransactionPool, ConfirmHandler, ValidateHandler, FetchHandler, ExistsHandler};
