//! Fixed-size hashes.

use std::{fmt, ops, str, cmp};
use std::hash::{Hash, Hasher};
use hex::{ToHex, FromHex, FromHexError};

/// 256-bit hash. Equality and ordering are bytewise.
#[derive(Clone)]
pub struct H256([u8; 32]);

impl Default for H256 {
	fn default() -> Self {
		H256([0u8; 32])
	}
}

impl H256 {
	pub fn from_slice(slice: &[u8]) -> Self {
		let mut result = H256::default();
		result.0.copy_from_slice(slice);
		result
	}

	pub fn from_reversed_str(s: &'static str) -> Self {
		H256::from(s).reversed()
	}

	pub fn to_reversed_str(&self) -> String {
		self.reversed().to_string()
	}

	pub fn take(self) -> [u8; 32] {
		self.0
	}

	pub fn reversed(&self) -> Self {
		let mut result = self.clone();
		result.0.reverse();
		result
	}

	pub fn size() -> usize {
		32
	}

	pub fn is_zero(&self) -> bool {
		self.0.iter().all(|b| *b == 0)
	}
}

impl From<[u8; 32]> for H256 {
	fn from(h: [u8; 32]) -> Self {
		H256(h)
	}
}

impl From<H256> for [u8; 32] {
	fn from(h: H256) -> Self {
		h.0
	}
}

impl<'a> From<&'a [u8]> for H256 {
	fn from(slice: &'a [u8]) -> Self {
		H256::from_slice(slice)
	}
}

impl From<&'static str> for H256 {
	fn from(s: &'static str) -> Self {
		s.parse().unwrap()
	}
}

impl From<u8> for H256 {
	fn from(v: u8) -> Self {
		let mut result = H256::default();
		result.0[0] = v;
		result
	}
}

impl str::FromStr for H256 {
	type Err = FromHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let vec: Vec<u8> = s.from_hex()?;
		match vec.len() {
			32 => {
				let mut result = [0u8; 32];
				result.copy_from_slice(&vec);
				Ok(H256(result))
			},
			_ => Err(FromHexError::InvalidHexLength),
		}
	}
}

impl fmt::Debug for H256 {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0.to_hex::<String>())
	}
}

impl fmt::Display for H256 {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.0.to_hex::<String>())
	}
}

impl ops::Deref for H256 {
	type Target = [u8; 32];

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl ops::DerefMut for H256 {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl AsRef<[u8]> for H256 {
	fn as_ref(&self) -> &[u8] {
		&self.0
	}
}

impl AsRef<H256> for H256 {
	fn as_ref(&self) -> &H256 {
		self
	}
}

impl cmp::PartialEq for H256 {
	fn eq(&self, other: &Self) -> bool {
		let self_ref: &[u8] = &self.0;
		let other_ref: &[u8] = &other.0;
		self_ref == other_ref
	}
}

impl cmp::PartialOrd for H256 {
	fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
		Some(self.cmp(other))
	}
}

impl cmp::Ord for H256 {
	fn cmp(&self, other: &Self) -> cmp::Ordering {
		let self_ref: &[u8] = &self.0;
		let other_ref: &[u8] = &other.0;
		self_ref.cmp(other_ref)
	}
}

impl Eq for H256 {}

impl Hash for H256 {
	fn hash<H>(&self, state: &mut H) where H: Hasher {
		state.write(&self.0);
		state.finish();
	}
}
