//! [`GpioBank`] over individual embedded-hal output pins.

use embedded_hal::digital::OutputPin;

use super::GpioBank;

/// A set of embedded-hal pins addressed as one bank.
///
/// Each pin is tagged with the bit it answers to in a mask. Writes are not
/// atomic across pins; they happen in array order. Pin errors cannot be
/// reported from interrupt context, so they are counted instead.
pub struct PinGroup<P: OutputPin, const N: usize> {
    pins: [(u8, P); N],
    errors: u32,
}

impl<P: OutputPin, const N: usize> PinGroup<P, N> {
    /// Group `pins`, each paired with its bit position.
    pub fn new(pins: [(u8, P); N]) -> Self {
        Self { pins, errors: 0 }
    }

    /// Number of failed pin writes since creation.
    #[inline]
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Give the pins back.
    pub fn release(self) -> [(u8, P); N] {
        self.pins
    }

    fn write(&mut self, mask: u32, high: bool) {
        for (bit, pin) in self.pins.iter_mut() {
            match 1u32.checked_shl(u32::from(*bit)) {
                Some(pin_mask) if mask & pin_mask != 0 => {}
                _ => continue,
            }
            let result = if high { pin.set_high() } else { pin.set_low() };
            if result.is_err() {
                self.errors = self.errors.wrapping_add(1);
            }
        }
    }
}

impl<P: OutputPin, const N: usize> GpioBank for PinGroup<P, N> {
    fn set_mask(&mut self, mask: u32) {
        self.write(mask, true);
    }

    fn clear_mask(&mut self, mask: u32) {
        self.write(mask, false);
    }
}
