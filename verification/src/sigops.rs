use chain::Transaction;
use script::Script;
use storage::TransactionOutputProvider;

/// Counts the signature operations of a transaction.
///
/// Output and input scripts are counted with the legacy rule. When `bip16`
/// is active, redeem scripts of P2SH spends are parsed out of the input
/// scripts and counted with the accurate rule on top.
pub fn transaction_sigops(
	transaction: &Transaction,
	store: &TransactionOutputProvider,
	bip16_active: bool,
) -> usize {
	let output_sigops: usize = transaction.outputs.iter().map(|output| {
		let output_script: Script = output.script_pubkey.clone().into();
		output_script.sigops_count(false)
	}).sum();

	if transaction.is_coinbase() {
		return output_sigops;
	}

	let mut input_sigops = 0usize;
	let mut bip16_sigops = 0usize;

	for input in &transaction.inputs {
		let input_script: Script = input.script_sig.clone().into();
		input_sigops += input_script.sigops_count(false);

		if bip16_active {
			let previous_output = store.transaction_output(&input.previous_output, usize::max_value());
			if let Some(previous_output) = previous_output {
				let prevout_script: Script = previous_output.script_pubkey.into();
				bip16_sigops += input_script.pay_to_script_hash_sigops(&prevout_script);
			}
		}
	}

	input_sigops + output_sigops + bip16_sigops
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;
	use chain::{OutPoint, Transaction, TransactionInput, TransactionOutput};
	use script::{Builder, Opcode};
	use storage::{NoopStore, TransactionOutputProvider};
	use super::transaction_sigops;

	struct Store(HashMap<OutPoint, TransactionOutput>);

	impl TransactionOutputProvider for Store {
		fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
			self.0.get(outpoint).cloned()
		}

		fn is_spent(&self, _outpoint: &OutPoint) -> bool {
			false
		}
	}

	#[test]
	fn test_transaction_sigops_outputs() {
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase("0000".into())],
			outputs: vec![
				TransactionOutput {
					value: 10,
					script_pubkey: vec![Opcode::OP_CHECKSIG as u8].into(),
				},
				TransactionOutput {
					value: 10,
					script_pubkey: vec![Opcode::OP_CHECKMULTISIG as u8].into(),
				},
			],
			lock_time: 0,
		};

		// coinbase: output sigops only, multisig counted as 20
		assert_eq!(transaction_sigops(&tx, &NoopStore, false), 21);
	}

	#[test]
	fn test_transaction_sigops_p2sh() {
		let redeem = Builder::default()
			.push_opcode(Opcode::OP_2)
			.push_opcode(Opcode::OP_CHECKMULTISIG)
			.into_script();
		let input_script = Builder::default()
			.push_data(&redeem)
			.into_script();
		let prevout_script: Vec<u8> = {
			let mut script = vec![Opcode::OP_HASH160 as u8, 0x14];
			script.extend_from_slice(&[0x42; 20]);
			script.push(Opcode::OP_EQUAL as u8);
			script
		};

		let prevout = OutPoint { hash: 1u8.into(), index: 0 };
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput {
				previous_output: prevout.clone(),
				script_sig: input_script.to_bytes(),
				sequence: 0xffffffff,
			}],
			outputs: vec![TransactionOutput { value: 10, script_pubkey: Default::default() }],
			lock_time: 0,
		};

		let mut outputs = HashMap::new();
		outputs.insert(prevout, TransactionOutput { value: 10, script_pubkey: prevout_script.into() });
		let store = Store(outputs);

		// without bip16 the redeem script is plain data
		assert_eq!(transaction_sigops(&tx, &store, false), 0);
		// with bip16 the redeem script is counted accurately
		assert_eq!(transaction_sigops(&tx, &store, true), 2);
	}
}
