use std::fmt;

/// Database errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
	/// Low level database error
	DatabaseError(String),
	/// Attaching a block whose parent is not the current tip
	UnknownParent,
	/// Detaching a block that is not on the main chain
	CannotDecanonize,
	/// Database contents do not match the expected chain layout
	InconsistentData,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			Error::DatabaseError(ref msg) => write!(f, "database error: {}", msg),
			Error::UnknownParent => "block parent is unknown".fmt(f),
			Error::CannotDecanonize => "cannot decanonize block".fmt(f),
			Error::InconsistentData => "database is inconsistent".fmt(f),
		}
	}
}
