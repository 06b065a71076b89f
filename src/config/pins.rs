//! Step and direction pin assignments.

use serde::Deserialize;

use crate::planner::{Axis, AXES};

/// Highest GPIO port index.
pub const MAX_PORT: u8 = 4;

/// Highest pin index within a port.
pub const MAX_PIN: u8 = 31;

/// GPIO bank and pin assignment for all step and direction outputs.
///
/// All step pins share one port and all direction pins share one port, so
/// each group can be written with a single masked set or clear.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    /// Port carrying the step pins.
    #[serde(default)]
    pub step_gpio_port: u8,

    /// Port carrying the direction pins.
    #[serde(default)]
    pub dir_gpio_port: u8,

    /// Alpha step pin.
    #[serde(default = "default_alpha_step")]
    pub alpha_step_pin: u8,

    /// Beta step pin.
    #[serde(default = "default_beta_step")]
    pub beta_step_pin: u8,

    /// Gamma step pin.
    #[serde(default = "default_gamma_step")]
    pub gamma_step_pin: u8,

    /// Alpha direction pin.
    #[serde(default = "default_alpha_dir")]
    pub alpha_dir_pin: u8,

    /// Beta direction pin.
    #[serde(default = "default_beta_dir")]
    pub beta_dir_pin: u8,

    /// Gamma direction pin.
    #[serde(default = "default_gamma_dir")]
    pub gamma_dir_pin: u8,
}

fn default_alpha_step() -> u8 {
    0
}

fn default_beta_step() -> u8 {
    1
}

fn default_gamma_step() -> u8 {
    2
}

fn default_alpha_dir() -> u8 {
    3
}

fn default_beta_dir() -> u8 {
    4
}

fn default_gamma_dir() -> u8 {
    5
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            step_gpio_port: 0,
            dir_gpio_port: 0,
            alpha_step_pin: default_alpha_step(),
            beta_step_pin: default_beta_step(),
            gamma_step_pin: default_gamma_step(),
            alpha_dir_pin: default_alpha_dir(),
            beta_dir_pin: default_beta_dir(),
            gamma_dir_pin: default_gamma_dir(),
        }
    }
}

impl PinMap {
    /// Step pins in axis order.
    #[inline]
    pub fn step_pins(&self) -> [u8; AXES] {
        [self.alpha_step_pin, self.beta_step_pin, self.gamma_step_pin]
    }

    /// Direction pins in axis order.
    #[inline]
    pub fn dir_pins(&self) -> [u8; AXES] {
        [self.alpha_dir_pin, self.beta_dir_pin, self.gamma_dir_pin]
    }

    /// Step pin bit for one axis.
    #[inline]
    pub fn step_bit(&self, axis: Axis) -> u32 {
        1 << self.step_pins()[axis.index()]
    }

    /// Direction pin bit for one axis.
    #[inline]
    pub fn dir_bit(&self, axis: Axis) -> u32 {
        1 << self.dir_pins()[axis.index()]
    }

    /// Mask covering every step pin.
    pub fn step_mask(&self) -> u32 {
        Axis::ALL.iter().fold(0, |mask, &axis| mask | self.step_bit(axis))
    }

    /// Mask covering every direction pin.
    pub fn dir_mask(&self) -> u32 {
        Axis::ALL.iter().fold(0, |mask, &axis| mask | self.dir_bit(axis))
    }

    /// Step pin levels for a set of stepping axes, bit n for axis n.
    pub fn step_bits_for(&self, axes: u8) -> u32 {
        Axis::ALL
            .iter()
            .filter(|axis| axes & axis.bit() != 0)
            .fold(0, |mask, &axis| mask | self.step_bit(axis))
    }

    /// Direction pin levels for a block's direction flags.
    pub fn dir_bits_for(&self, direction_bits: u8) -> u32 {
        Axis::ALL
            .iter()
            .filter(|axis| direction_bits & axis.bit() != 0)
            .fold(0, |mask, &axis| mask | self.dir_bit(axis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_masks() {
        let pins = PinMap::default();

        assert_eq!(pins.step_mask(), 0b000_111);
        assert_eq!(pins.dir_mask(), 0b111_000);
    }

    #[test]
    fn test_dir_bits_follow_axis_flags() {
        let pins = PinMap {
            alpha_dir_pin: 10,
            beta_dir_pin: 11,
            gamma_dir_pin: 20,
            ..PinMap::default()
        };

        assert_eq!(pins.dir_bits_for(0b010), 1 << 11);
        assert_eq!(pins.dir_bits_for(0b101), (1 << 10) | (1 << 20));
        assert_eq!(pins.dir_bits_for(0), 0);
    }
}
