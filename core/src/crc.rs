//! Parameterized CRC register for any width from 1 to 64 bits.
//!
//! Follows the usual register model: the message is shifted MSB-first into a
//! `width`-bit register, `reflect_in` bit-reverses each input byte first, and
//! `reflect_out` bit-reverses the final register across the width before
//! the XOR-out is applied.
//!
//! One stepping routine serves every [`Reflection`] combination. The search
//! sweeps reuse a single [`Register`] and only swap the polynomial between
//! candidates.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Widest supported register.
pub const MAX_WIDTH: u32 = 64;

/// Check that `width` is a supported CRC width.
pub fn check_width(width: u32) -> Result<()> {
    if (1..=MAX_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(Error::UnsupportedWidth { width })
    }
}

/// Number of output bytes needed to carry a `width`-bit CRC.
#[inline]
pub const fn output_len(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// All-ones mask covering `width` bits.
#[inline]
pub const fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Reverse the low `width` bits of `value`.
#[inline]
pub const fn reflect(value: u64, width: u32) -> u64 {
    value.reverse_bits() >> (64 - width)
}

/// The four reflect-input / reflect-output combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Reflection {
    /// Bytes consumed MSB-first, register emitted as-is.
    None,
    /// Bytes consumed LSB-first, register emitted as-is.
    Input,
    /// Bytes consumed MSB-first, register bit-reversed on output.
    Output,
    /// Bytes consumed LSB-first, register bit-reversed on output.
    Both,
}

impl Reflection {
    /// Every combination, in sweep order.
    pub const ALL: [Reflection; 4] = [
        Reflection::None,
        Reflection::Input,
        Reflection::Output,
        Reflection::Both,
    ];

    /// Build from the conventional pair of flags.
    pub const fn new(reflect_in: bool, reflect_out: bool) -> Self {
        match (reflect_in, reflect_out) {
            (false, false) => Reflection::None,
            (true, false) => Reflection::Input,
            (false, true) => Reflection::Output,
            (true, true) => Reflection::Both,
        }
    }

    /// Whether input bytes are consumed least-significant bit first.
    #[inline]
    pub const fn reflect_in(self) -> bool {
        matches!(self, Reflection::Input | Reflection::Both)
    }

    /// Whether the final register is bit-reversed.
    #[inline]
    pub const fn reflect_out(self) -> bool {
        matches!(self, Reflection::Output | Reflection::Both)
    }

    /// Apply the output reflection to a raw register value.
    ///
    /// Reflection is an involution, so this also maps an observed output
    /// back to the raw register it came from.
    #[inline]
    pub const fn finish(self, register: u64, width: u32) -> u64 {
        if self.reflect_out() {
            reflect(register, width)
        } else {
            register
        }
    }
}

/// A CRC shift register with a swappable polynomial.
///
/// Holds no heap state; the sweep keeps one per task and calls
/// [`set_polynomial`](Self::set_polynomial) and [`load`](Self::load)
/// between candidates.
#[derive(Debug, Clone)]
pub struct Register {
    width: u32,
    polynomial: u64,
    reflect_in: bool,
    mask: u64,
    top: u64,
    value: u64,
}

impl Register {
    /// Create a zeroed register.
    ///
    /// `width` must already have passed [`check_width`].
    pub fn new(width: u32, polynomial: u64, reflection: Reflection) -> Self {
        debug_assert!(check_width(width).is_ok());
        let mask = mask(width);
        Self {
            width,
            polynomial: polynomial & mask,
            reflect_in: reflection.reflect_in(),
            mask,
            top: 1u64 << (width - 1),
            value: 0,
        }
    }

    /// Replace the generator polynomial, keeping the current value.
    #[inline]
    pub fn set_polynomial(&mut self, polynomial: u64) {
        self.polynomial = polynomial & self.mask;
    }

    /// Overwrite the register contents.
    #[inline]
    pub fn load(&mut self, value: u64) {
        self.value = value & self.mask;
    }

    /// Raw register contents (before output reflection).
    #[inline]
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Shift `data` through the register.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.step(byte);
        }
    }

    #[inline]
    fn step(&mut self, byte: u8) {
        let byte = if self.reflect_in {
            byte.reverse_bits()
        } else {
            byte
        };

        if self.width >= 8 {
            self.value ^= u64::from(byte) << (self.width - 8);
            for _ in 0..8 {
                let shifted = (self.value << 1) & self.mask;
                self.value = if self.value & self.top != 0 {
                    shifted ^ self.polynomial
                } else {
                    shifted
                };
            }
        } else {
            // Narrow registers cannot hold a whole byte; feed bit by bit.
            for shift in (0..8).rev() {
                let feedback = ((self.value >> (self.width - 1)) ^ u64::from(byte >> shift)) & 1;
                self.value = (self.value << 1) & self.mask;
                if feedback != 0 {
                    self.value ^= self.polynomial;
                }
            }
        }
    }
}

/// CRC over `data` with zero init and zero XOR-out.
///
/// This is the function the differential technique reduces every capture
/// pair to: all fixed contributions cancel, leaving only polynomial and
/// reflection.
pub fn compute_raw(width: u32, polynomial: u64, reflection: Reflection, data: &[u8]) -> u64 {
    let mut register = Register::new(width, polynomial, reflection);
    register.update(data);
    reflection.finish(register.value(), width)
}

/// A complete CRC definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrcModel {
    /// Register width in bits.
    pub width: u32,
    /// Generator polynomial in normal (MSB-first) form, top bit implicit.
    pub polynomial: u64,
    /// Initial register contents.
    pub init: u64,
    /// Input/output reflection convention.
    pub reflection: Reflection,
    /// Constant XORed into the final value.
    pub xor_out: u64,
}

impl CrcModel {
    /// Compute the CRC of `data`.
    pub fn compute(&self, data: &[u8]) -> u64 {
        let mut register = Register::new(self.width, self.polynomial, self.reflection);
        register.load(self.init);
        register.update(data);
        (self.reflection.finish(register.value(), self.width) ^ self.xor_out) & mask(self.width)
    }
}
