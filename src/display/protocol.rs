//! Controller wire protocol
//!
//! Each sub-panel receives one message:
//!
//! ```text
//! 0x80  COMMAND  ADDRESS  DATA[width]  0x8F
//! ```
//!
//! - COMMAND: store the data without showing it yet (0x84 / 0x86 / 0x88
//!   for 28 / 56 / 112 data bytes)
//! - ADDRESS: the sub-panel's bus address
//! - DATA: one byte per column, left to right; bit 0 is the top dot and
//!   bit 6 the bottom one, bit 7 is always clear
//!
//! After every sub-panel has its data a single `0x80 0x82 0x8F` message
//! makes them all flip at once.

use super::bitmap::Bitmap;
use super::geometry::{PanelGeometry, PanelWidth, SubPanel, PANEL_HEIGHT};

/// Start of every message
pub const FRAME_START: u8 = 0x80;

/// End of every message
pub const FRAME_END: u8 = 0x8F;

/// Show previously stored data on all sub-panels
pub const CMD_REFRESH: u8 = 0x82;

/// Store-without-refresh command for a sub-panel width
pub fn write_command(width: PanelWidth) -> u8 {
    match width {
        PanelWidth::W28 => 0x84,
        PanelWidth::W56 => 0x86,
        PanelWidth::W112 => 0x88,
    }
}

/// Size in bytes of an encoded display frame
pub fn frame_len(geometry: &PanelGeometry) -> usize {
    let per_panel = 4 + geometry.panel_width().columns() as usize;
    geometry.layout().len() * per_panel + 3
}

/// Encode a whole display frame, refresh message included
///
/// The bitmap must have the geometry's dimensions.
pub fn encode(bitmap: &Bitmap, geometry: &PanelGeometry) -> Vec<u8> {
    debug_assert_eq!(
        (bitmap.width(), bitmap.height()),
        (geometry.width(), geometry.height())
    );
    let mut out = Vec::with_capacity(frame_len(geometry));
    for panel in geometry.panels() {
        encode_panel(bitmap, geometry, panel, &mut out);
    }
    out.extend_from_slice(&[FRAME_START, CMD_REFRESH, FRAME_END]);
    out
}

/// Append the message for one sub-panel
pub fn encode_panel(bitmap: &Bitmap, geometry: &PanelGeometry, panel: SubPanel, out: &mut Vec<u8>) {
    let width = geometry.panel_width();
    out.push(FRAME_START);
    out.push(write_command(width));
    out.push(panel.address);

    for column in 0..width.columns() {
        let x = panel.x + column;
        let source_x = if geometry.is_mirrored() {
            geometry.width() - 1 - x
        } else {
            x
        };

        let mut byte = 0u8;
        for row in 0..PANEL_HEIGHT {
            if bitmap.get(source_x, panel.y + row) {
                byte |= 1 << row;
            }
        }
        out.push(byte);
    }

    out.push(FRAME_END);
}
