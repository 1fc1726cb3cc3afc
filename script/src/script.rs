//! Serialized script, used inside transaction inputs and outputs.

use std::{fmt, ops};
use primitives::bytes::Bytes;
use {Opcode, Error};

/// Serialized script, used inside transaction inputs and outputs.
#[derive(PartialEq, Default, Clone)]
pub struct Script {
	data: Bytes,
}

impl From<&'static str> for Script {
	fn from(s: &'static str) -> Self {
		Script::new(s.into())
	}
}

impl From<Bytes> for Script {
	fn from(s: Bytes) -> Self {
		Script::new(s)
	}
}

impl From<Vec<u8>> for Script {
	fn from(v: Vec<u8>) -> Self {
		Script::new(v.into())
	}
}

impl From<Script> for Bytes {
	fn from(script: Script) -> Self {
		script.data
	}
}

impl Script {
	/// Script constructor.
	pub fn new(data: Bytes) -> Self {
		Script {
			data: data,
		}
	}

	pub fn to_bytes(&self) -> Bytes {
		self.data.clone()
	}

	/// Is this a pay-to-script-hash output: `OP_HASH160 <20 bytes> OP_EQUAL`.
	pub fn is_pay_to_script_hash(&self) -> bool {
		self.data.len() == 23 &&
			self.data[0] == Opcode::OP_HASH160 as u8 &&
			self.data[1] == 0x14 &&
			self.data[22] == Opcode::OP_EQUAL as u8
	}

	pub fn iter(&self) -> Instructions {
		Instructions {
			data: &self.data,
			position: 0,
		}
	}

	/// Counts signature operations.
	///
	/// Counting stops at the first malformed instruction; everything counted
	/// before it still stands. This matches the legacy consensus behavior.
	pub fn sigops_count(&self, accurate: bool) -> usize {
		let mut last_opcode = 0xffu8;
		let mut total = 0usize;

		for instruction in self.iter() {
			let instruction = match instruction {
				Ok(i) => i,
				Err(_) => break,
			};

			match Opcode::from_u8(instruction.opcode) {
				Some(Opcode::OP_CHECKSIG) | Some(Opcode::OP_CHECKSIGVERIFY) => {
					total += 1;
				},
				Some(Opcode::OP_CHECKMULTISIG) | Some(Opcode::OP_CHECKMULTISIGVERIFY) => {
					if accurate && Opcode::is_within_op_n(last_opcode) {
						total += Opcode::decode_op_n(last_opcode) as usize;
					} else {
						total += 20;
					}
				},
				_ => (),
			}

			last_opcode = instruction.opcode;
		}

		total
	}

	/// Signature operations of the redeem script, when spending a P2SH output.
	///
	/// Uses the accurate OP_N rule for CHECKMULTISIG.
	pub fn pay_to_script_hash_sigops(&self, prev_out: &Script) -> usize {
		if !prev_out.is_pay_to_script_hash() {
			return 0;
		}

		if self.data.is_empty() {
			return 0;
		}

		// the redeem script is the last data push of the input script
		let script: Script = self.iter().last()
			.and_then(|instruction| instruction.ok())
			.and_then(|instruction| instruction.data)
			.map(|data| data.to_vec().into())
			.unwrap_or_else(|| Vec::new().into());

		script.sigops_count(true)
	}
}

impl ops::Deref for Script {
	type Target = [u8];

	fn deref(&self) -> &Self::Target {
		&self.data
	}
}

impl fmt::Debug for Script {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		self.data.fmt(f)
	}
}

/// A single parsed script instruction.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Instruction<'a> {
	/// Raw opcode byte.
	pub opcode: u8,
	/// Full encoded length of the instruction, including pushed data.
	pub step: usize,
	/// Pushed data, when the instruction is a push.
	pub data: Option<&'a [u8]>,
}

/// Iterator over script instructions.
pub struct Instructions<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> Iterator for Instructions<'a> {
	type Item = Result<Instruction<'a>, Error>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.position >= self.data.len() {
			return None;
		}

		match get_instruction(&self.data[self.position..]) {
			Ok(instruction) => {
				self.position += instruction.step;
				Some(Ok(instruction))
			},
			Err(err) => {
				// fuse the iterator on error
				self.position = self.data.len();
				Some(Err(err))
			},
		}
	}
}

fn read_usize(data: &[u8], size: usize) -> Result<usize, Error> {
	if data.len() < size {
		return Err(Error::BadInstruction);
	}

	let result = data.iter()
		.take(size)
		.enumerate()
		.fold(0, |acc, (i, x)| acc + ((*x as usize) << (i * 8)));
	Ok(result)
}

fn get_instruction(data: &[u8]) -> Result<Instruction, Error> {
	let opcode = data[0];
	let (length_bytes, data_len) = match opcode {
		0x01...0x4b => (0usize, opcode as usize),
		0x4c => (1, read_usize(&data[1..], 1)?),
		0x4d => (2, read_usize(&data[1..], 2)?),
		0x4e => (4, read_usize(&data[1..], 4)?),
		_ => {
			return Ok(Instruction {
				opcode: opcode,
				step: 1,
				data: None,
			});
		},
	};

	let step = 1 + length_bytes + data_len;
	if data.len() < step {
		return Err(Error::BadInstruction);
	}

	Ok(Instruction {
		opcode: opcode,
		step: step,
		data: Some(&data[1 + length_bytes..step]),
	})
}
