//! Shadow copy of the APU register file.

use crate::chip::function::FunctionSpec;
use crate::chip::Channel;

/// Number of register indices covered (0x00..=0x17).
pub const REGISTER_COUNT: usize = 0x18;

/// Last-known byte of every APU register.
///
/// Re-encoding function writes into physical writes needs the other bits of
/// the target register. One `RegisterFile` is owned by one conversion and
/// passed in explicitly; nothing is shared between calls.
///
/// Registers start out as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    registers: [u8; REGISTER_COUNT],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            registers: [0; REGISTER_COUNT],
        }
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current byte at `register`, or `None` outside the register file.
    pub fn read(&self, register: u8) -> Option<u8> {
        self.registers.get(register as usize).copied()
    }

    pub fn write(&mut self, register: u8, value: u8) {
        if let Some(slot) = self.registers.get_mut(register as usize) {
            *slot = value;
        }
    }

    /// Merge a field value into the register at `channel` + `offset`.
    ///
    /// Returns the physical register index and its new byte.
    pub fn apply(&mut self, channel: Channel, offset: u8, spec: FunctionSpec, value: u8) -> (u8, u8) {
        let register = channel.base_register() + offset;
        let byte = spec.insert(self.read(register).unwrap_or(0), value);
        self.write(register, byte);
        (register, byte)
    }

    pub fn clear(&mut self) {
        self.registers = [0; REGISTER_COUNT];
    }
}
