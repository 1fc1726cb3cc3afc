//! Script accounting used by consensus checks.
//!
//! Script *execution* is delegated to an external consensus oracle; this
//! crate only knows how to step through serialized scripts, count signature
//! operations, recognize the P2SH pattern and build the small prefixes
//! consensus rules compare against (BIP34 coinbase height).

extern crate primitives;

mod builder;
mod error;
mod num;
mod opcode;
mod script;

pub use primitives::bytes;

pub use builder::Builder;
pub use error::Error;
pub use num::Num;
pub use opcode::Opcode;
pub use script::{Script, Instruction, Instructions};
