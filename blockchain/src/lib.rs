//! Chain organization.
//!
//! Candidate blocks arrive out of order; the organizer decides which of them
//! extend the best chain, parks the ones whose parents are still missing,
//! and atomically swaps chain branches when a heavier fork shows up. All
//! intake is serialized through a single ordered queue, so there is exactly
//! one writer to the stored chain.

#[macro_use]
extern crate log;
extern crate linked_hash_map;
extern crate parking_lot;
extern crate time;

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

mod header_branch;
mod organizer;
mod orphan_pool;
mod populate_block;
mod populate_chain_state;

pub use primitives::hash;

pub use header_branch::HeaderBranch;
pub use organizer::{BlockOrganizer, BlockList, OrganizeHandler, ReorganizeHandler};
pub use orphan_pool::OrphanPool;
pub use populate_block::{populate_block, PopulatedBlock};
pub use populate_chain_state::ChainStatePopulator;
