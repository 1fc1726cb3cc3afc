use std::collections::HashMap;
use rayon::prelude::{IntoParallelRefIterator, IndexedParallelIterator, ParallelIterator};
use chain::{IndexedBlockHeader, IndexedTransaction, OutPoint};
use network::{ConsensusParams, ForkFlags};
use dispatcher::StopSignal;
use storage::{DuplexTransactionOutputProvider, TransactionMetaProvider, TransactionOutputProvider};
use canon::CanonBlock;
use chain_state::ChainState;
use constants::MAX_MONEY;
use fee::checked_transaction_fee;
use oracle::ConsensusOracle;
use sigops::transaction_sigops;
use error::{Error, TransactionError};

/// Full consensus validation of an ordered block: input connection, double
/// spend accounting, sigop accumulation and the fee tally.
///
/// Per-transaction work runs in parallel; the per-transaction sigop counts
/// and input sums are combined only after the fan-in completes.
pub struct BlockConnector<'a> {
	block: CanonBlock<'a>,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
	output_store: DuplexTransactionOutputProvider<'a>,
	transactions: Vec<TransactionConnector<'a>>,
	stop: &'a StopSignal,
}

impl<'a> BlockConnector<'a> {
	pub fn new(
		block: CanonBlock<'a>,
		consensus: &'a ConsensusParams,
		state: &'a ChainState,
		meta_store: &'a TransactionMetaProvider,
		prevout_store: &'a TransactionOutputProvider,
		oracle: &'a ConsensusOracle,
		stop: &'a StopSignal,
	) -> Self {
		trace!(target: "verification", "Block connection {}", block.hash().to_reversed_str());
		let output_store = DuplexTransactionOutputProvider::new(prevout_store, block.raw());

		BlockConnector {
			block: block,
			consensus: consensus,
			state: state,
			output_store: output_store,
			transactions: block.transactions()
				.iter()
				.enumerate()
				.map(|(transaction_index, tx)| TransactionConnector {
					transaction_index: transaction_index,
					transaction: tx,
					block_header: block.header(),
					consensus: consensus,
					state: state,
					meta_store: meta_store,
					output_store: output_store,
					oracle: oracle,
				})
				.collect(),
			stop: stop,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.ensure_running()?;
		self.check_duplicate_outpoints()?;
		self.ensure_running()?;

		let transaction_sigops = self.check_transactions()?;
		self.ensure_running()?;

		let block_sigops = transaction_sigops.into_iter()
			.fold(0usize, |acc, tx_sigops| acc.saturating_add(tx_sigops));
		if block_sigops > self.consensus.max_block_sigops {
			return Err(Error::MaximumSigops);
		}

		self.check_coinbase_claim()?;
		Ok(())
	}

	fn ensure_running(&self) -> Result<(), Error> {
		if self.stop.is_stopped() {
			Err(Error::ServiceStopped)
		} else {
			Ok(())
		}
	}

	/// No output may be consumed twice within the block. Runs before the
	/// parallel per-transaction pass, which only sees spends of the stored
	/// chain.
	fn check_duplicate_outpoints(&self) -> Result<(), Error> {
		let mut spent: HashMap<&OutPoint, usize> = HashMap::new();

		for (transaction_index, tx) in self.block.transactions().iter().enumerate().skip(1) {
			for input in &tx.raw.inputs {
				if spent.insert(&input.previous_output, transaction_index).is_some() {
					return Err(Error::Transaction(transaction_index, TransactionError::UsingSpentOutput(
						input.previous_output.hash.clone(),
						input.previous_output.index,
					)));
				}
			}
		}

		Ok(())
	}

	fn check_transactions(&self) -> Result<Vec<usize>, Error> {
		self.transactions.par_iter()
			.enumerate()
			.map(|(index, tx)| tx.check().map_err(|err| Error::Transaction(index, err)))
			.collect()
	}

	/// The coinbase may claim at most the subsidy plus the fees actually
	/// left on the table by the block's transactions.
	fn check_coinbase_claim(&self) -> Result<(), Error> {
		let mut fees: u64 = 0;

		for (transaction_index, tx) in self.block.transactions().iter().enumerate().skip(1) {
			let tx_fee = checked_transaction_fee(&self.output_store, transaction_index, &tx.raw)
				.map_err(|tx_err| Error::Transaction(transaction_index, tx_err))?;

			let (sum, overflow) = fees.overflowing_add(tx_fee);
			if overflow {
				return Err(Error::TransactionFeesOverflow);
			}
			fees = sum;
		}

		let claim = self.block.transactions()[0].raw.total_spends();

		let (max_claim, overflow) = fees.overflowing_add(self.consensus.block_reward(self.state.height));
		if overflow {
			return Err(Error::TransactionFeeAndRewardOverflow);
		}

		if claim > max_claim {
			Err(Error::CoinbaseOverspend { expected_max: max_claim, actual: claim })
		} else {
			Ok(())
		}
	}
}

struct TransactionConnector<'a> {
	transaction_index: usize,
	transaction: &'a IndexedTransaction,
	block_header: &'a IndexedBlockHeader,
	consensus: &'a ConsensusParams,
	state: &'a ChainState,
	meta_store: &'a TransactionMetaProvider,
	output_store: DuplexTransactionOutputProvider<'a>,
	oracle: &'a ConsensusOracle,
}

impl<'a> TransactionConnector<'a> {
	/// Returns the accurate sigop count of the transaction on success.
	fn check(&self) -> Result<usize, TransactionError> {
		let bip16_active = self.state.is_bip16_active(self.consensus);
		let sigops = transaction_sigops(&self.transaction.raw, &self.output_store, bip16_active);
		if sigops > self.consensus.max_block_sigops {
			return Err(TransactionError::MaxSigops);
		}

		self.check_bip30()?;
		self.check_missing_inputs()?;
		self.check_maturity()?;
		self.check_overspent()?;
		self.check_double_spent()?;
		self.check_scripts()?;

		Ok(sigops)
	}

	/// BIP30: a transaction id that already exists in the chain is only
	/// acceptable when the original is fully spent. The coinbase is subject
	/// to the rule as well; the historical violations were coinbases.
	fn check_bip30(&self) -> Result<(), TransactionError> {
		if !self.consensus.forks.contains(ForkFlags::BIP30) {
			return Ok(());
		}

		if self.state.allows_duplicates(self.consensus) {
			return Ok(());
		}

		match self.meta_store.transaction_meta(&self.transaction.hash) {
			Some(ref meta) if !meta.is_fully_spent() => {
				Err(TransactionError::UnspentTransactionWithTheSameHash)
			},
			_ => Ok(()),
		}
	}

	fn check_missing_inputs(&self) -> Result<(), TransactionError> {
		let missing_index = self.transaction.raw.inputs.iter()
			.position(|input| {
				let is_not_null = !input.previous_output.is_null();
				let is_missing = self.output_store.transaction_output(&input.previous_output, self.transaction_index).is_none();
				is_not_null && is_missing
			});

		match missing_index {
			Some(index) => Err(TransactionError::Input(index)),
			None => Ok(()),
		}
	}

	fn check_maturity(&self) -> Result<(), TransactionError> {
		let immature_spend = self.transaction.raw.inputs.iter()
			.any(|input| match self.meta_store.transaction_meta(&input.previous_output.hash) {
				Some(ref meta) if meta.is_coinbase() &&
					self.state.height < meta.height() + self.consensus.coinbase_maturity => true,
				_ => false,
			});

		if immature_spend {
			Err(TransactionError::Maturity)
		} else {
			Ok(())
		}
	}

	fn check_overspent(&self) -> Result<(), TransactionError> {
		if self.transaction.raw.is_coinbase() {
			return Ok(());
		}

		let mut available: u64 = 0;
		for (input_index, input) in self.transaction.raw.inputs.iter().enumerate() {
			let value = self.output_store.transaction_output(&input.previous_output, self.transaction_index)
				.map(|output| output.value)
				.ok_or(TransactionError::Input(input_index))?;

			if value > MAX_MONEY {
				return Err(TransactionError::InputValueOverflow);
			}

			available = available.checked_add(value)
				.ok_or(TransactionError::InputValueOverflow)?;
			if available > MAX_MONEY {
				return Err(TransactionError::InputValueOverflow);
			}
		}

		let spends = self.transaction.raw.total_spends();
		if spends > available {
			Err(TransactionError::Overspend)
		} else {
			Ok(())
		}
	}

	/// Spends of the stored chain below the fork point. Positional double
	/// spends within the block were rejected before the parallel pass.
	fn check_double_spent(&self) -> Result<(), TransactionError> {
		for input in &self.transaction.raw.inputs {
			if input.previous_output.is_null() {
				continue;
			}
			if self.output_store.is_spent(&input.previous_output) {
				return Err(TransactionError::UsingSpentOutput(
					input.previous_output.hash.clone(),
					input.previous_output.index,
				));
			}
		}

		Ok(())
	}

	fn check_scripts(&self) -> Result<(), TransactionError> {
		if self.transaction.raw.is_coinbase() {
			return Ok(());
		}

		for (input_index, input) in self.transaction.raw.inputs.iter().enumerate() {
			let prevout = self.output_store.transaction_output(&input.previous_output, self.transaction_index)
				.ok_or(TransactionError::Input(input_index))?;

			if !self.oracle.validate_consensus(
				&prevout.script_pubkey,
				&self.transaction.raw,
				input_index,
				&self.block_header.raw,
				self.state.height,
			) {
				return Err(TransactionError::Signature(input_index));
			}
		}

		Ok(())
	}
}
