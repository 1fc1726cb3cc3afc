use primitives::bigint::U256;

lazy_static! {
	static ref MAX_BITS_MAINNET: U256 = U256::from(0xffffu64) << 208;
	static ref MAX_BITS_TESTNET: U256 = U256::from(0xffffu64) << 208;
	static ref MAX_BITS_REGTEST: U256 = U256::from(0xffffu64) << 240;
}

/// Network magic type.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Network {
	/// The original and main network for Bitcoin transactions.
	Mainnet,
	/// The main network for testing purposes.
	Testnet,
	/// Local private network for testing.
	Regtest,
	/// Network for unit tests only.
	Unitest,
}

impl Network {
	pub fn max_bits(&self) -> U256 {
		match *self {
			Network::Mainnet => MAX_BITS_MAINNET.clone(),
			Network::Testnet => MAX_BITS_TESTNET.clone(),
			Network::Regtest | Network::Unitest => MAX_BITS_REGTEST.clone(),
		}
	}
}
