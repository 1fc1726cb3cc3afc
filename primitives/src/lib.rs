extern crate byteorder;
extern crate rustc_hex as hex;
extern crate bigint as uint;

pub mod bytes;
pub mod compact;
pub mod hash;

pub mod bigint {
	pub use uint::U256;
}
