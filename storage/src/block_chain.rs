use hash::H256;
use chain::IndexedBlock;
use Error;

/// The single mutation the chain database supports: an atomic branch swap.
///
/// `fork` is the height of the last block common to both branches (`None`
/// when attaching at the very bottom of an empty chain). `outgoing` lists the
/// hashes of the currently stored blocks above the fork, tip first; they are
/// detached and their spends unwound. `incoming` blocks are attached on top
/// of the fork in order. A plain chain extension is a reorganization with an
/// empty `outgoing` list.
///
/// Readers observe either the state before the call or the state after it.
pub trait BlockChain: Send + Sync {
	fn reorganize(&self, fork: Option<u32>, incoming: &[IndexedBlock], outgoing: &[H256]) -> Result<(), Error>;
}
