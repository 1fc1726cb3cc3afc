#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate bitflags;

extern crate chain;
extern crate primitives;

mod consensus;
mod network;

pub use primitives::{hash, compact};

pub use consensus::{ConsensusParams, ForkFlags};
pub use network::Network;
