use chain::{BlockHeader, Transaction};
use primitives::bytes::Bytes;

/// Script-execution oracle.
///
/// Input script validation is performed by an external consensus library and
/// is treated here as a pure function: given a previous output script, a
/// spending transaction and the block context, it answers whether the spend
/// is valid under consensus rules.
pub trait ConsensusOracle: Send + Sync {
	fn validate_consensus(
		&self,
		prevout_script: &Bytes,
		transaction: &Transaction,
		input_index: usize,
		header: &BlockHeader,
		height: u32,
	) -> bool;
}

/// Oracle that accepts every script. Used by tests and header-only modes.
pub struct NoopOracle;

impl ConsensusOracle for NoopOracle {
	fn validate_consensus(
		&self,
		_prevout_script: &Bytes,
		_transaction: &Transaction,
		_input_index: usize,
		_header: &BlockHeader,
		_height: u32,
	) -> bool {
		true
	}
}
