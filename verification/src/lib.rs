//! Bitcoin consensus verification
//!
//! Full block verification consists of three phases:
//! - `check` - context-free validation, safe before the block is even stored
//! - `accept` - contextual header validation against populated chain state
//! - `connect` - full input connection against the spent-output state
//!
//! In this library, the `check` phase is done by `VerifyXXX` structures,
//! `accept` by the `BlockAcceptor` and `connect` by the `BlockConnector`.
//! Each phase is a composition of single-rule checkers, polls the shared
//! stop signal between rules and reports the first failing rule.
//!
//! Use cases:
//!
//! --> A. on_new_block:
//!
//! A.1 BlockVerifier (no chain context required)
//!
//! A.2 when the block extends or overtakes the stored chain:
//! A.2.1 populate chain state for the candidate height
//! A.2.2 BlockAcceptor
//! A.2.3 populate previous outputs of every input
//! A.2.4 BlockConnector
//!
//! --> B. on_memory_pool_transaction
//!
//! B.1 MemoryPoolTransactionVerifier
//! B.2 acceptance against chain + pool (performed by the mempool itself)

#[macro_use]
extern crate log;
extern crate rayon;

extern crate chain;
extern crate dispatcher;
extern crate network;
extern crate primitives;
extern crate script;
extern crate serialization as ser;
extern crate storage;

#[cfg(test)]
extern crate db;
#[cfg(test)]
extern crate test_data;

pub mod constants;
mod canon;
mod chain_state;
mod error;
mod fee;
mod oracle;
mod sigops;
mod work;

// context-free verification
mod verify_block;
mod verify_transaction;

// full verification
mod accept_block;
mod connect_block;

pub use primitives::{bigint, hash, compact};

pub use canon::CanonBlock;
pub use chain_state::{ChainState, ChainStateMap};
pub use error::{Error, TransactionError};
pub use fee::checked_transaction_fee;
pub use oracle::{ConsensusOracle, NoopOracle};
pub use sigops::transaction_sigops;
pub use work::{work_required, is_valid_proof_of_work, is_valid_proof_of_work_hash, block_proof};

pub use verify_block::BlockVerifier;
pub use verify_transaction::{TransactionVerifier, MemoryPoolTransactionVerifier};

pub use accept_block::BlockAcceptor;
pub use connect_block::BlockConnector;
