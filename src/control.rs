// src/control.rs
//
// The two external switches (SAW excitation, triboelectric boost).
//
// A UI thread flips them while the tick loop reads them. Both bits live in one
// AtomicU8 so a single load always yields a matching pair.

use std::sync::atomic::{AtomicU8, Ordering};

const SAW_BIT: u8 = 0b01;
const TRIBO_BIT: u8 = 0b10;

/// One consistent reading of both switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Toggles {
    pub excitation: bool,
    pub enhancement: bool,
}

impl Toggles {
    pub fn new(excitation: bool, enhancement: bool) -> Self {
        Self {
            excitation,
            enhancement,
        }
    }

    fn to_bits(self) -> u8 {
        (if self.excitation { SAW_BIT } else { 0 }) | (if self.enhancement { TRIBO_BIT } else { 0 })
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            excitation: bits & SAW_BIT != 0,
            enhancement: bits & TRIBO_BIT != 0,
        }
    }
}

/// Switches shared between the UI and the tick loop (wrap in an `Arc`).
#[derive(Debug, Default)]
pub struct SharedToggles {
    bits: AtomicU8,
}

impl SharedToggles {
    pub fn new(initial: Toggles) -> Self {
        Self {
            bits: AtomicU8::new(initial.to_bits()),
        }
    }

    /// Read both switches at once. Call exactly once per tick.
    pub fn snapshot(&self) -> Toggles {
        Toggles::from_bits(self.bits.load(Ordering::Acquire))
    }

    pub fn store(&self, t: Toggles) {
        self.bits.store(t.to_bits(), Ordering::Release);
    }

    pub fn set_excitation(&self, on: bool) {
        self.set_bit(SAW_BIT, on);
    }

    pub fn set_enhancement(&self, on: bool) {
        self.set_bit(TRIBO_BIT, on);
    }

    /// Flip the excitation switch; returns the new state of both.
    pub fn toggle_excitation(&self) -> Toggles {
        Toggles::from_bits(self.bits.fetch_xor(SAW_BIT, Ordering::AcqRel) ^ SAW_BIT)
    }

    /// Flip the enhancement switch; returns the new state of both.
    pub fn toggle_enhancement(&self) -> Toggles {
        Toggles::from_bits(self.bits.fetch_xor(TRIBO_BIT, Ordering::AcqRel) ^ TRIBO_BIT)
    }

    fn set_bit(&self, bit: u8, on: bool) {
        if on {
            self.bits.fetch_or(bit, Ordering::AcqRel);
        } else {
            self.bits.fetch_and(!bit, Ordering::AcqRel);
        }
    }
}
