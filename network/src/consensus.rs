use hash::H256;
use Network;

bitflags! {
	/// Soft-fork rules that may be enabled on a chain.
	pub struct ForkFlags: u32 {
		/// BIP16: pay-to-script-hash evaluation and sigop accounting.
		const BIP16 = 0x0001;
		/// BIP30: no duplicate of a not-fully-spent transaction id.
		const BIP30 = 0x0002;
		/// BIP34: coinbase input script starts with the block height.
		const BIP34 = 0x0004;
		/// BIP65: CHECKLOCKTIMEVERIFY (raises the minimum block version to 4).
		const BIP65 = 0x0008;
		/// BIP66: strict DER signatures (raises the minimum block version to 3).
		const BIP66 = 0x0010;
		/// BIP68, BIP112, BIP113: relative locks and median-time-past finality.
		const CSV = 0x0020;
		/// BIP141: segregated witness. Recognized for configuration
		/// compatibility; witness data never reaches this core.
		const BIP141 = 0x0040;
		/// Permit duplicate transaction ids at the two historical heights.
		const ALLOW_COLLISIONS = 0x0080;
		/// Activate version-gated rules at fixed heights instead of sampling
		/// ancestor versions.
		const BIP90 = 0x0100;
	}
}

#[derive(Debug, Clone)]
/// Parameters that influence chain consensus.
pub struct ConsensusParams {
	/// Network.
	pub network: Network,
	/// Enabled soft forks.
	pub forks: ForkFlags,
	/// Expected block hashes at given heights, ordered by height.
	pub checkpoints: Vec<(u32, H256)>,
	/// Time when BIP16 becomes active.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0016.mediawiki
	pub bip16_time: u32,
	/// Heights at which BIP30 is not enforced.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0030.mediawiki
	pub bip30_exceptions: Vec<u32>,
	/// Maximum height of version 1 blocks, and the height at which the
	/// coinbase must start with the serialized block height.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0034.mediawiki
	pub bip34_height: u32,
	/// Block height at which BIP65 becomes active.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0065.mediawiki
	pub bip65_height: u32,
	/// Block height at which BIP66 becomes active.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0066.mediawiki
	pub bip66_height: u32,
	/// Number of ancestor versions sampled when activation heights are not
	/// fixed (BIP90 disabled).
	pub version_sample_size: usize,
	/// Sampled versions required to activate a version-gated rule.
	pub version_activation_threshold: usize,
	/// Sampled versions required to enforce a minimum block version.
	pub version_enforcement_threshold: usize,
	/// Maximum serialized block size in bytes.
	pub max_block_size: usize,
	/// Maximum number of signature operations in a block.
	pub max_block_sigops: usize,
	/// Number of confirmations before a coinbase output may be spent.
	pub coinbase_maturity: u32,
	/// How far in the future a block timestamp may be, in seconds.
	pub max_future_block_time: u32,
	/// Number of ancestor timestamps the median-time-past covers.
	pub median_time_span: usize,
	/// Number of blocks between difficulty adjustments.
	pub retargeting_interval: u32,
	/// Optimal interval between blocks, in seconds.
	pub target_spacing: u32,
	/// Optimal timespan of a retargeting interval, in seconds.
	pub target_timespan: u32,
	/// Testnet rule: a block may fall back to the maximum target when no
	/// block arrived for twice the target spacing.
	pub allow_min_difficulty_blocks: bool,
	/// Number of blocks between subsidy halvings.
	pub subsidy_halving_interval: u32,
	/// The chain is considered stale when the tip is this many hours behind
	/// the wall clock.
	pub notify_limit_hours: u32,
}

impl ConsensusParams {
	pub fn new(network: Network) -> Self {
		let default_forks = ForkFlags::BIP16 | ForkFlags::BIP30 | ForkFlags::BIP34 | ForkFlags::BIP65
			| ForkFlags::BIP66 | ForkFlags::ALLOW_COLLISIONS | ForkFlags::BIP90;

		match network {
			Network::Mainnet => ConsensusParams {
				network: network,
				forks: default_forks,
				checkpoints: Vec::new(),
				bip16_time: 1333238400,  // Apr 1 2012
				bip30_exceptions: vec![91842, 91880],
				bip34_height: 237370,
				bip65_height: 388381,
				bip66_height: 363725,
				version_sample_size: 1000,
				version_activation_threshold: 750,
				version_enforcement_threshold: 950,
				max_block_size: 1_000_000,
				max_block_sigops: 20_000,
				coinbase_maturity: 100,
				max_future_block_time: 2 * 60 * 60,
				median_time_span: 11,
				retargeting_interval: 2016,
				target_spacing: 10 * 60,
				target_timespan: 14 * 24 * 60 * 60,
				allow_min_difficulty_blocks: false,
				subsidy_halving_interval: 210_000,
				notify_limit_hours: 24,
			},
			Network::Testnet => ConsensusParams {
				network: network,
				forks: default_forks,
				checkpoints: Vec::new(),
				bip16_time: 1333238400,
				bip30_exceptions: Vec::new(),
				bip34_height: 21111,
				bip65_height: 581885,
				bip66_height: 330776,
				version_sample_size: 100,
				version_activation_threshold: 51,
				version_enforcement_threshold: 75,
				max_block_size: 1_000_000,
				max_block_sigops: 20_000,
				coinbase_maturity: 100,
				max_future_block_time: 2 * 60 * 60,
				median_time_span: 11,
				retargeting_interval: 2016,
				target_spacing: 10 * 60,
				target_timespan: 14 * 24 * 60 * 60,
				allow_min_difficulty_blocks: true,
				subsidy_halving_interval: 210_000,
				notify_limit_hours: 24,
			},
			Network::Regtest | Network::Unitest => ConsensusParams {
				network: network,
				forks: default_forks,
				checkpoints: Vec::new(),
				bip16_time: 0,
				bip30_exceptions: Vec::new(),
				bip34_height: 100_000_000,
				bip65_height: 100_000_000,
				bip66_height: 100_000_000,
				version_sample_size: 144,
				version_activation_threshold: 108,
				version_enforcement_threshold: 108,
				max_block_size: 1_000_000,
				max_block_sigops: 20_000,
				coinbase_maturity: 100,
				max_future_block_time: 2 * 60 * 60,
				median_time_span: 11,
				retargeting_interval: 2016,
				target_spacing: 10 * 60,
				target_timespan: 14 * 24 * 60 * 60,
				allow_min_difficulty_blocks: true,
				subsidy_halving_interval: 150,
				notify_limit_hours: 24,
			},
		}
	}

	/// Expected hash at the given height, if a checkpoint is configured.
	pub fn checkpoint(&self, height: u32) -> Option<&H256> {
		self.checkpoints.iter()
			.find(|&&(checkpoint_height, _)| checkpoint_height == height)
			.map(|&(_, ref hash)| hash)
	}

	/// Is the given height free of the BIP30 duplicate-id rule?
	pub fn is_bip30_exception(&self, height: u32) -> bool {
		self.bip30_exceptions.iter().any(|h| *h == height)
	}

	/// Miner reward at the given height, in satoshis.
	pub fn block_reward(&self, height: u32) -> u64 {
		let mut res = 50 * 100 * 1000 * 1000;
		for _ in 0..height / self.subsidy_halving_interval {
			res /= 2;
		}
		res
	}

	/// Staleness threshold in seconds.
	pub fn notify_limit_seconds(&self) -> u32 {
		self.notify_limit_hours * 60 * 60
	}
}
