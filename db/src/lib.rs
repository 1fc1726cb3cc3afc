extern crate parking_lot;

extern crate chain;
extern crate primitives;
extern crate storage;

#[cfg(test)]
extern crate test_data;

mod block_chain_db;

pub use block_chain_db::BlockChainDatabase;
