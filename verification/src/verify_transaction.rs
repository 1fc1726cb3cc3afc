use std::ops;
use ser::Serializable;
use chain::IndexedTransaction;
use storage::NoopStore;
use sigops::transaction_sigops;
use error::TransactionError;
use constants::{MAX_MONEY, MIN_COINBASE_SIZE, MAX_COINBASE_SIZE};

/// Context-free transaction checks, run for every transaction of a block
/// during the `check` phase.
pub struct TransactionVerifier<'a> {
	pub empty: TransactionEmpty<'a>,
	pub null_non_coinbase: TransactionNullNonCoinbase<'a>,
	pub oversized_coinbase: TransactionOversizedCoinbase<'a>,
	pub value_overflow: TransactionValueOverflow<'a>,
	pub duplicate_inputs: TransactionDuplicateInputs<'a>,
}

impl<'a> TransactionVerifier<'a> {
	pub fn new(transaction: &'a IndexedTransaction) -> Self {
		trace!(target: "verification", "Tx pre-verification {}", transaction.hash.to_reversed_str());
		TransactionVerifier {
			empty: TransactionEmpty::new(transaction),
			null_non_coinbase: TransactionNullNonCoinbase::new(transaction),
			oversized_coinbase: TransactionOversizedCoinbase::new(transaction, MIN_COINBASE_SIZE..MAX_COINBASE_SIZE),
			value_overflow: TransactionValueOverflow::new(transaction),
			duplicate_inputs: TransactionDuplicateInputs::new(transaction),
		}
	}

	pub fn check(&self) -> Result<(), TransactionError> {
		self.empty.check()?;
		self.null_non_coinbase.check()?;
		self.oversized_coinbase.check()?;
		self.value_overflow.check()?;
		self.duplicate_inputs.check()?;
		Ok(())
	}
}

/// Context-free checks of a transaction offered to the memory pool.
pub struct MemoryPoolTransactionVerifier<'a> {
	pub empty: TransactionEmpty<'a>,
	pub null_non_coinbase: TransactionNullNonCoinbase<'a>,
	pub is_coinbase: TransactionMemoryPoolCoinbase<'a>,
	pub size: TransactionAbsoluteSize<'a>,
	pub value_overflow: TransactionValueOverflow<'a>,
	pub duplicate_inputs: TransactionDuplicateInputs<'a>,
	pub sigops: TransactionSigops<'a>,
}

impl<'a> MemoryPoolTransactionVerifier<'a> {
	pub fn new(transaction: &'a IndexedTransaction, max_size: usize, max_sigops: usize) -> Self {
		trace!(target: "verification", "Mempool-Tx pre-verification {}", transaction.hash.to_reversed_str());
		MemoryPoolTransactionVerifier {
			empty: TransactionEmpty::new(transaction),
			null_non_coinbase: TransactionNullNonCoinbase::new(transaction),
			is_coinbase: TransactionMemoryPoolCoinbase::new(transaction),
			size: TransactionAbsoluteSize::new(transaction, max_size),
			value_overflow: TransactionValueOverflow::new(transaction),
			duplicate_inputs: TransactionDuplicateInputs::new(transaction),
			sigops: TransactionSigops::new(transaction, max_sigops),
		}
	}

	pub fn check(&self) -> Result<(), TransactionError> {
		self.empty.check()?;
		self.null_non_coinbase.check()?;
		self.is_coinbase.check()?;
		self.size.check()?;
		self.value_overflow.check()?;
		self.duplicate_inputs.check()?;
		self.sigops.check()?;
		Ok(())
	}
}

pub struct TransactionEmpty<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionEmpty<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionEmpty {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if self.transaction.raw.is_empty() {
			Err(TransactionError::Empty)
		} else {
			Ok(())
		}
	}
}

pub struct TransactionNullNonCoinbase<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionNullNonCoinbase<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionNullNonCoinbase {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if !self.transaction.raw.is_coinbase() && self.transaction.raw.is_null() {
			Err(TransactionError::NullNonCoinbase)
		} else {
			Ok(())
		}
	}
}

pub struct TransactionOversizedCoinbase<'a> {
	transaction: &'a IndexedTransaction,
	size_range: ops::Range<usize>,
}

impl<'a> TransactionOversizedCoinbase<'a> {
	fn new(transaction: &'a IndexedTransaction, size_range: ops::Range<usize>) -> Self {
		TransactionOversizedCoinbase {
			transaction: transaction,
			size_range: size_range,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if self.transaction.raw.is_coinbase() {
			let script_len = self.transaction.raw.inputs[0].script_sig.len();
			if script_len < self.size_range.start || script_len > self.size_range.end {
				return Err(TransactionError::CoinbaseSignatureLength(script_len));
			}
		}

		Ok(())
	}
}

pub struct TransactionMemoryPoolCoinbase<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionMemoryPoolCoinbase<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionMemoryPoolCoinbase {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		if self.transaction.raw.is_coinbase() {
			Err(TransactionError::MemoryPoolCoinbase)
		} else {
			Ok(())
		}
	}
}

pub struct TransactionAbsoluteSize<'a> {
	transaction: &'a IndexedTransaction,
	max_size: usize,
}

impl<'a> TransactionAbsoluteSize<'a> {
	fn new(transaction: &'a IndexedTransaction, max_size: usize) -> Self {
		TransactionAbsoluteSize {
			transaction: transaction,
			max_size: max_size,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let size = self.transaction.raw.serialized_size();
		if size > self.max_size {
			Err(TransactionError::MaxSize)
		} else {
			Ok(())
		}
	}
}

/// Output values must stay within the money supply, individually and summed.
pub struct TransactionValueOverflow<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionValueOverflow<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionValueOverflow {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let mut total: u64 = 0;
		for output in &self.transaction.raw.outputs {
			if output.value > MAX_MONEY {
				return Err(TransactionError::OutputValueOverflow);
			}

			total = total.checked_add(output.value)
				.ok_or(TransactionError::OutputValueOverflow)?;
			if total > MAX_MONEY {
				return Err(TransactionError::OutputValueOverflow);
			}
		}

		Ok(())
	}
}

/// An outpoint may be referenced at most once within a transaction.
pub struct TransactionDuplicateInputs<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionDuplicateInputs<'a> {
	fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionDuplicateInputs {
			transaction: transaction,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let inputs = &self.transaction.raw.inputs;
		for (index, input) in inputs.iter().enumerate() {
			if let Some(earlier) = inputs[..index].iter()
				.position(|i| i.previous_output == input.previous_output) {
				return Err(TransactionError::DuplicateInput(earlier, index));
			}
		}

		Ok(())
	}
}

pub struct TransactionSigops<'a> {
	transaction: &'a IndexedTransaction,
	max_sigops: usize,
}

impl<'a> TransactionSigops<'a> {
	fn new(transaction: &'a IndexedTransaction, max_sigops: usize) -> Self {
		TransactionSigops {
			transaction: transaction,
			max_sigops: max_sigops,
		}
	}

	fn check(&self) -> Result<(), TransactionError> {
		let sigops = transaction_sigops(&self.transaction.raw, &NoopStore, false);
		if sigops > self.max_sigops {
			Err(TransactionError::MaxSigops)
		} else {
			Ok(())
		}
	}
}
