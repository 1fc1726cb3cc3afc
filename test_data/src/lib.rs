//! Test block and transaction builders.

extern crate chain;
extern crate network;
extern crate primitives;

pub mod block_builder;
pub mod invoke;

pub use block_builder::{BlockBuilder, BlockHeaderBuilder, TransactionBuilder};

/// Starts a fluent block builder.
pub fn block_builder() -> BlockBuilder {
	BlockBuilder::new()
}
