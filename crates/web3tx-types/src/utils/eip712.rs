//! Low-level EIP-712 encoding helpers.
//!
//! These helpers provide:
//! - Final digest computation (0x1901 || domainHash || structHash)
//! - A word encoder for the atomic field types of `encodeData`

use alloy_primitives::{keccak256, Address, B256, I256, U256};

/// Compute the final EIP-712 digest: keccak256(0x1901 || domainHash || structHash).
pub fn compute_final_digest(domain_hash: &B256, struct_hash: &B256) -> B256 {
	let mut out = Vec::with_capacity(2 + 32 + 32);
	out.push(0x19);
	out.push(0x01);
	out.extend_from_slice(domain_hash.as_slice());
	out.extend_from_slice(struct_hash.as_slice());
	keccak256(out)
}

/// Encoder producing the 32-byte words of an EIP-712 `encodeData` call.
pub struct Eip712AbiEncoder {
	buf: Vec<u8>,
}

impl Default for Eip712AbiEncoder {
	fn default() -> Self {
		Self::new()
	}
}

impl Eip712AbiEncoder {
	pub fn new() -> Self {
		Self { buf: Vec::new() }
	}

	pub fn push_b256(&mut self, v: &B256) {
		self.buf.extend_from_slice(v.as_slice());
	}

	/// Left-pads a 20-byte address into a word.
	pub fn push_address(&mut self, addr: &Address) {
		let mut word = [0u8; 32];
		word[12..].copy_from_slice(addr.as_slice());
		self.buf.extend_from_slice(&word);
	}

	pub fn push_u256(&mut self, v: U256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	/// Two's complement, sign-extended to 256 bits.
	pub fn push_i256(&mut self, v: I256) {
		let word: [u8; 32] = v.to_be_bytes::<32>();
		self.buf.extend_from_slice(&word);
	}

	pub fn push_bool(&mut self, v: bool) {
		self.push_u256(U256::from(v as u8));
	}

	/// Right-pads a `bytesN` value (N <= 32) into a word.
	pub fn push_fixed_bytes(&mut self, v: &[u8]) {
		let mut word = [0u8; 32];
		let len = v.len().min(32);
		word[..len].copy_from_slice(&v[..len]);
		self.buf.extend_from_slice(&word);
	}

	pub fn finish(self) -> Vec<u8> {
		self.buf
	}
}
