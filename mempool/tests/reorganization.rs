//! Mempool behavior across chain reorganizations.

extern crate blockchain;
extern crate chain;
extern crate db;
extern crate dispatcher;
extern crate mempool;
extern crate network;
extern crate primitives;
extern crate storage;
extern crate test_data;
extern crate verification;

use std::sync::Arc;
use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;
use blockchain::BlockOrganizer;
use chain::{IndexedBlock, IndexedTransaction, Transaction};
use db::BlockChainDatabase;
use dispatcher::Dispatcher;
use mempool::{Error, TransactionPool};
use network::{ConsensusParams, Network};
use primitives::hash::H256;
use storage::SharedStore;
use verification::NoopOracle;

const TIMEOUT: u64 = 10;

struct Node {
	organizer: Arc<BlockOrganizer>,
	pool: Arc<TransactionPool>,
	_dispatcher: Arc<Dispatcher>,
}

fn node() -> Node {
	let store: SharedStore = Arc::new(BlockChainDatabase::new());
	let dispatcher = Arc::new(Dispatcher::new(4, "mempool-reorg-test"));
	let mut consensus = ConsensusParams::new(Network::Unitest);
	consensus.coinbase_maturity = 0;

	let organizer = Arc::new(BlockOrganizer::new(
		store.clone(),
		consensus.clone(),
		Arc::new(NoopOracle),
		dispatcher.clone(),
		64,
	));
	organizer.start();

	let pool = Arc::new(TransactionPool::new(
		store,
		consensus,
		Arc::new(NoopOracle),
		&dispatcher,
		32,
	));
	TransactionPool::start(&pool, &organizer);

	Node {
		organizer: organizer,
		pool: pool,
		_dispatcher: dispatcher,
	}
}

fn organize(node: &Node, block: IndexedBlock) {
	let (tx, rx) = channel();
	node.organizer.organize(block, Box::new(move |result| {
		tx.send(result).unwrap();
	}));
	rx.recv_timeout(Duration::from_secs(TIMEOUT))
		.expect("organize verdict")
		.expect("test blocks are valid");
}

fn store_transaction(node: &Node, tx: IndexedTransaction) -> Receiver<Result<(), Error>> {
	let (confirm_tx, confirm_rx) = channel();
	let (validate_tx, validate_rx) = channel();
	node.pool.store(
		tx,
		Box::new(move |result| confirm_tx.send(result).unwrap()),
		Box::new(move |result| validate_tx.send(result).unwrap()),
	);
	validate_rx.recv_timeout(Duration::from_secs(TIMEOUT))
		.expect("validation verdict")
		.expect("test transactions are valid");
	confirm_rx
}

fn exists(node: &Node, hash: H256) -> bool {
	let (tx, rx) = channel();
	node.pool.exists(hash, Box::new(move |result| tx.send(result).unwrap()));
	rx.recv_timeout(Duration::from_secs(TIMEOUT)).unwrap().unwrap()
}

fn coinbase_block(parent: H256, tag: u8, time: u32, coinbase_outputs: u64) -> IndexedBlock {
	let mut builder = test_data::block_builder().transaction().coinbase(vec![0x01, tag].into());
	for _ in 0..coinbase_outputs {
		builder = builder.output().value(1_000).build();
	}
	builder.build().merkled_header().time(time).parent(parent).build().build().into()
}

fn spend(funding: &Transaction, index: u32) -> IndexedTransaction {
	test_data::block_builder()
		.transaction()
			.input().hash(funding.hash()).index(index).build()
			.output().value(900).build()
			.build()
		.merkled_header().build()
		.build()
		.transactions
		.remove(0)
		.into()
}

#[test]
fn test_extension_confirms_pooled_transactions() {
	let node = node();
	let genesis = coinbase_block(H256::default(), 0, 1000, 2);
	let genesis_coinbase = genesis.transactions[0].raw.clone();
	organize(&node, genesis.clone());

	// pool a spend of the confirmed coinbase
	let tx1 = spend(&genesis_coinbase, 0);
	let confirm1 = store_transaction(&node, tx1.clone());
	assert!(exists(&node, tx1.hash.clone()));

	// a block confirming tx1 extends the chain: the entry leaves the pool
	// with a success confirmation
	let b1: IndexedBlock = test_data::block_builder()
		.transaction()
			.coinbase(vec![0x01, 0x10].into())
			.output().value(0).build()
			.build()
		.with_transaction(tx1.raw.clone())
		.merkled_header().time(1100).parent(genesis.header.hash.clone()).build()
		.build()
		.into();
	organize(&node, b1);

	assert_eq!(confirm1.recv_timeout(Duration::from_secs(TIMEOUT)).unwrap(), Ok(()));
	assert!(!exists(&node, tx1.hash.clone()));
}

#[test]
fn test_reorganization_invalidates_pool() {
	let node = node();
	let genesis = coinbase_block(H256::default(), 0, 1000, 2);
	let genesis_coinbase = genesis.transactions[0].raw.clone();
	organize(&node, genesis.clone());

	let a1 = coinbase_block(genesis.header.hash.clone(), 1, 1100, 1);
	organize(&node, a1);

	// pool a perfectly valid transaction
	let tx = spend(&genesis_coinbase, 1);
	let confirm = store_transaction(&node, tx.clone());
	assert!(exists(&node, tx.hash.clone()));

	// a heavier branch arrives and unwinds a1: the pool reaction is
	// deliberately coarse, everything is dropped
	let b1 = coinbase_block(genesis.header.hash.clone(), 11, 1150, 1);
	let b2 = coinbase_block(b1.header.hash.clone(), 12, 1250, 1);
	organize(&node, b1);
	organize(&node, b2);

	assert_eq!(
		confirm.recv_timeout(Duration::from_secs(TIMEOUT)).unwrap(),
		Err(Error::BlockchainReorganized)
	);
	assert!(!exists(&node, tx.hash.clone()));
}

#[test]
fn test_pool_stops_with_organizer() {
	let node = node();
	let genesis = coinbase_block(H256::default(), 0, 1000, 1);
	let genesis_coinbase = genesis.transactions[0].raw.clone();
	organize(&node, genesis);

	node.organizer.stop();

	// the shutdown propagated through the subscription
	let (tx_sender, rx) = channel();
	node.pool.validate(spend(&genesis_coinbase, 0), Box::new(move |result| {
		tx_sender.send(result).unwrap();
	}));
	assert_eq!(
		rx.recv_timeout(Duration::from_secs(TIMEOUT)).unwrap(),
		Err(Error::ServiceStopped)
	);
}
