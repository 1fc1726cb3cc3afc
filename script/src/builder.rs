use primitives::bytes::Bytes;
use {Opcode, Script, Num};

/// Script builder
#[derive(Default)]
pub struct Builder {
	data: Bytes,
}

impl Builder {
	/// Appends a number push, using OP_0 / OP_1NEGATE / OP_N shortcuts where
	/// the protocol does.
	pub fn push_num(self, num: Num) -> Self {
		let value = num.value();
		if value == 0 {
			self.push_opcode(Opcode::OP_0)
		} else if value == -1 {
			self.push_opcode(Opcode::OP_1NEGATE)
		} else if value >= 1 && value <= 16 {
			let opcode = Opcode::from_u8(Opcode::OP_1 as u8 + value as u8 - 1)
				.expect("OP_1 + [0, 15] is within the OP_N range; qed");
			self.push_opcode(opcode)
		} else {
			self.push_data(&num.to_bytes())
		}
	}

	/// Appends an opcode.
	pub fn push_opcode(mut self, opcode: Opcode) -> Self {
		self.data.push(opcode as u8);
		self
	}

	/// Appends a data push.
	pub fn push_data(mut self, data: &[u8]) -> Self {
		let len = data.len();
		if len < Opcode::OP_PUSHDATA1 as usize {
			self.data.push(len as u8);
		} else if len < 0x100 {
			self.data.push(Opcode::OP_PUSHDATA1 as u8);
			self.data.push(len as u8);
		} else if len < 0x10000 {
			self.data.push(Opcode::OP_PUSHDATA2 as u8);
			self.data.push(len as u8);
			self.data.push((len >> 8) as u8);
		} else {
			self.data.push(Opcode::OP_PUSHDATA4 as u8);
			self.data.push(len as u8);
			self.data.push((len >> 8) as u8);
			self.data.push((len >> 16) as u8);
			self.data.push((len >> 24) as u8);
		}

		self.data.extend_from_slice(data);
		self
	}

	/// Builds the final script.
	pub fn into_script(self) -> Script {
		Script::new(self.data)
	}

	/// Builds the final script bytes.
	pub fn into_bytes(self) -> Bytes {
		self.data
	}
}
