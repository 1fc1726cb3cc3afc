use std::{io, cmp, fmt};
use hash::H256;
use ser::{Deserializable, Reader, Error as ReaderError};
use transaction::Transaction;
use read_and_hash::ReadAndHash;

#[derive(Default, Clone)]
pub struct IndexedTransaction {
	pub hash: H256,
	pub raw: Transaction,
}

impl fmt::Debug for IndexedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("IndexedTransaction")
			.field("hash", &self.hash.reversed())
			.field("raw", &self.raw)
			.finish()
	}
}

impl From<Transaction> for IndexedTransaction {
	fn from(tx: Transaction) -> Self {
		Self::from_raw(tx)
	}
}

impl From<&'static str> for IndexedTransaction {
	fn from(s: &'static str) -> Self {
		Self::from_raw(Transaction::from(s))
	}
}

impl IndexedTransaction {
	pub fn new(hash: H256, transaction: Transaction) -> Self {
		IndexedTransaction {
			hash: hash,
			raw: transaction,
		}
	}

	/// Explicit conversion of the raw Transaction into IndexedTransaction.
	///
	/// Hashes transaction contents.
	pub fn from_raw<T>(transaction: T) -> Self where Transaction: From<T> {
		let transaction = Transaction::from(transaction);
		Self::new(transaction.hash(), transaction)
	}
}

impl cmp::PartialEq for IndexedTransaction {
	fn eq(&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}

impl Deserializable for IndexedTransaction {
	fn deserialize<T>(reader: &mut Reader<T>) -> Result<Self, ReaderError> where T: io::Read {
		let data = reader.read_and_hash::<Transaction>()?;
		// TODO: use len
		let tx = IndexedTransaction {
			raw: data.data,
			hash: data.hash,
		};

		Ok(tx)
	}
}
