//! Built-in calibration tables
//!
//! Each table is located by its stock bytes and replaced by a same-sized
//! tuned variant.

use crate::error::PatchResult;
use crate::patch::ConstantTablePatch;

/// Label of the Bluetooth LE connection parameter table.
pub const BLUETOOTH_LE_PARAMS_LABEL: &str = "bluetooth-le-params";

/// Stock Bluetooth LE connection parameters.
pub const BLUETOOTH_LE_PARAMS_OLD: [u8; 8] = [0x09, 0x00, 0x11, 0x00, 0x00, 0x00, 0x58, 0x02];

/// Relaxed connection interval, same supervision timeout.
pub const BLUETOOTH_LE_PARAMS_NEW: [u8; 8] = [0x0F, 0x00, 0x1E, 0x00, 0x00, 0x00, 0x58, 0x02];

/// Label of the 3.7 V battery discharge curve on Silk hardware.
pub const SILK_3V7_BATTERY_CURVE_LABEL: &str = "silk-3v7-battery-curve";

/// Stock battery curve: `(percent: u16, millivolts: u16)` pairs followed by
/// curve flags.
#[rustfmt::skip]
pub const SILK_3V7_BATTERY_CURVE_OLD: [u8; 64] = [
    0x00, 0x00, 0xe4, 0x0c, 0x02, 0x00, 0xa2, 0x0d,
    0x05, 0x00, 0x1f, 0x0e, 0x0a, 0x00, 0x47, 0x0e,
    0x14, 0x00, 0x74, 0x0e, 0x1e, 0x00, 0x97, 0x0e,
    0x28, 0x00, 0xb0, 0x0e, 0x32, 0x00, 0xd8, 0x0e,
    0x3c, 0x00, 0x0f, 0x0f, 0x46, 0x00, 0x5f, 0x0f,
    0x50, 0x00, 0xb9, 0x0f, 0x5a, 0x00, 0x18, 0x10,
    0x64, 0x00, 0x86, 0x10, 0x01, 0x00, 0x01, 0x01,
    0x01, 0x01, 0x18, 0xff, 0x01, 0x01, 0xff, 0x06,
];

/// Recalibrated curve for 3.7 V cells.
#[rustfmt::skip]
pub const SILK_3V7_BATTERY_CURVE_NEW: [u8; 64] = [
    0x00, 0x00, 0x1c, 0x0c, 0x02, 0x00, 0x52, 0x0d,
    0x05, 0x00, 0x10, 0x0e, 0x0a, 0x00, 0x56, 0x0e,
    0x14, 0x00, 0x7e, 0x0e, 0x1e, 0x00, 0xa1, 0x0e,
    0x28, 0x00, 0xbf, 0x0e, 0x32, 0x00, 0xe2, 0x0e,
    0x3c, 0x00, 0x14, 0x0f, 0x46, 0x00, 0x55, 0x0f,
    0x50, 0x00, 0xa0, 0x0f, 0x5a, 0x00, 0xf0, 0x0f,
    0x64, 0x00, 0x18, 0x10, 0x01, 0x00, 0x01, 0x01,
    0x01, 0x01, 0x18, 0xff, 0x01, 0x01, 0xff, 0x06,
];

/// Bluetooth LE connection parameter patch.
pub fn bluetooth_le_params() -> PatchResult<ConstantTablePatch> {
    ConstantTablePatch::new(
        BLUETOOTH_LE_PARAMS_LABEL,
        BLUETOOTH_LE_PARAMS_OLD,
        BLUETOOTH_LE_PARAMS_NEW,
    )
}

/// Silk 3.7 V battery curve patch.
pub fn silk_3v7_battery_curve() -> PatchResult<ConstantTablePatch> {
    ConstantTablePatch::new(
        SILK_3V7_BATTERY_CURVE_LABEL,
        SILK_3V7_BATTERY_CURVE_OLD,
        SILK_3V7_BATTERY_CURVE_NEW,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_valid() -> PatchResult<()> {
        let bt = bluetooth_le_params()?;
        assert_eq!(bt.label(), "bluetooth-le-params");
        assert_eq!(bt.old().len(), bt.new_bytes().len());

        let silk = silk_3v7_battery_curve()?;
        assert_eq!(silk.old().len(), 64);
        assert_ne!(silk.old(), silk.new_bytes());
        Ok(())
    }

    #[test]
    fn test_silk_curve_flags_unchanged() {
        assert_eq!(
            SILK_3V7_BATTERY_CURVE_OLD.get(52..),
            SILK_3V7_BATTERY_CURVE_NEW.get(52..)
        );
    }
}
