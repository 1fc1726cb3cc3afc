use hash::H256;
use compact::Compact;
use storage::Error as DBError;

#[derive(Debug, PartialEq)]
/// All possible verification errors
pub enum Error {
	/// The service is stopping, the operation was abandoned
	ServiceStopped,
	/// has an equal duplicate in the chain
	Duplicate,
	/// No transactions in block
	Empty,
	/// Block size is invalid
	Size(usize),
	/// Invalid proof-of-work (Block hash does not satisfy nBits)
	Pow,
	/// Futuristic timestamp
	FuturisticTimestamp,
	/// First transaction is not a coinbase transaction
	Coinbase,
	/// A coinbase transaction at a position other than the first
	ExtraCoinbases,
	/// One of the transactions is invalid (corresponding index and specific transaction error)
	Transaction(usize, TransactionError),
	/// Contains duplicated transactions
	DuplicatedTransactions,
	/// Maximum sigops operations exceeded - will not provide how much it was in total
	/// since it stops counting once the limit is reached
	MaximumSigops,
	/// Invalid merkle root
	MerkleRoot,
	/// nBits do not match difficulty rules
	Difficulty { expected: Compact, actual: Compact },
	/// Timestamp is not greater than the median-time-past
	Timestamp,
	/// Block transactions are not final.
	NonFinalBlock,
	/// Block hash disagrees with a checkpoint
	Checkpoint,
	/// Old version block.
	OldVersionBlock,
	/// Coinbase has invalid script sig prefix (BIP34)
	CoinbaseScript,
	/// Coinbase spends too much
	CoinbaseOverspend { expected_max: u64, actual: u64 },
	/// Sum of the transaction fees in block exceeds u64::max
	TransactionFeesOverflow,
	/// Sum of the transaction fees in block + coinbase reward exceeds u64::max
	TransactionFeeAndRewardOverflow,
	/// A collaborator could not supply required data
	OperationFailed,
	/// Database error
	Database(DBError),
}

impl From<DBError> for Error {
	fn from(err: DBError) -> Self {
		Error::Database(err)
	}
}

#[derive(Debug, PartialEq)]
/// Possible transactions verification errors
pub enum TransactionError {
	/// Transaction has no inputs or no outputs
	Empty,
	/// Transaction is not coinbase transaction but has null inputs
	NullNonCoinbase,
	/// Coinbase signature is not in the range 2-100
	CoinbaseSignatureLength(usize),
	/// Transaction has too large output value, or the sum overflows
	OutputValueOverflow,
	/// Referenced input value exceeds the money supply, or the sum overflows
	InputValueOverflow,
	/// Transaction has duplicate inputs. Inputs indexes are provided.
	DuplicateInput(usize, usize),
	/// Transaction size exceeds the block size limit
	MaxSize,
	/// Transaction has more sigops than it's allowed
	MaxSigops,
	/// Transaction is a part of memory pool, but is a coinbase
	MemoryPoolCoinbase,
	/// Not found corresponding output for transaction input
	Input(usize),
	/// Referenced coinbase output for the transaction input is not mature enough
	Maturity,
	/// Spends more than claims
	Overspend,
	/// Not fully spent transaction with the same hash already exists, bip30.
	UnspentTransactionWithTheSameHash,
	/// Using output that is surely spent
	UsingSpentOutput(H256, u32),
	/// Input script failed the consensus oracle
	Signature(usize),
}
