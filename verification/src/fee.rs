use chain::Transaction;
use storage::TransactionOutputProvider;
use constants::MAX_MONEY;
use TransactionError;

/// Computes the miner fee of a transaction.
///
/// Every referenced output has to be resolvable through `store`; value sums
/// are checked against the money supply cap.
pub fn checked_transaction_fee(
	store: &TransactionOutputProvider,
	transaction_index: usize,
	transaction: &Transaction,
) -> Result<u64, TransactionError> {
	let mut incoming: u64 = 0;
	for (input_index, input) in transaction.inputs.iter().enumerate() {
		let prevout = store.transaction_output(&input.previous_output, transaction_index)
			.ok_or(TransactionError::Input(input_index))?;

		if prevout.value > MAX_MONEY {
			return Err(TransactionError::InputValueOverflow);
		}

		incoming = incoming.checked_add(prevout.value)
			.ok_or(TransactionError::InputValueOverflow)?;
		if incoming > MAX_MONEY {
			return Err(TransactionError::InputValueOverflow);
		}
	}

	let spends = transaction.total_spends();
	incoming.checked_sub(spends).ok_or(TransactionError::Overspend)
}
