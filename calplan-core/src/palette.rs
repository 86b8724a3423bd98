//! Event color palette.
//!
//! The remote calendar identifies event colors by a small string id; the
//! rendering surface wants a hex value. Both are looked up through a fixed
//! table indexed by a palette index. Index 0 is the default color and the
//! last entry is an out-of-range sentinel: it is never offered for selection
//! and outbound lookups clamp to the default instead of returning it.

use tracing::warn;

/// A single palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteColor {
    /// Color id as understood by the remote calendar (`colorId`)
    pub color_id: &'static str,
    /// Hex color used for rendering
    pub hex: &'static str,
}

pub const PALETTE: [PaletteColor; 13] = [
    PaletteColor { color_id: "0", hex: "#cf4b4bff" },
    PaletteColor { color_id: "1", hex: "#2468a0ff" },
    PaletteColor { color_id: "2", hex: "#33b670ff" },
    PaletteColor { color_id: "3", hex: "#8e24aaff" },
    PaletteColor { color_id: "4", hex: "#ca469cff" },
    PaletteColor { color_id: "5", hex: "#f9b01eff" },
    PaletteColor { color_id: "6", hex: "#f4511eff" },
    PaletteColor { color_id: "7", hex: "#038be5ff" },
    PaletteColor { color_id: "8", hex: "#605F5E" },
    PaletteColor { color_id: "9", hex: "#394bb4ff" },
    PaletteColor { color_id: "10", hex: "#0b8043" },
    PaletteColor { color_id: "11", hex: "#FB3640" },
    PaletteColor { color_id: "12", hex: "#000000" },
];

pub const DEFAULT_COLOR_INDEX: i32 = 0;

/// Clamp target for invalid indices. Not selectable.
pub const OUT_OF_RANGE_COLOR_INDEX: i32 = PALETTE.len() as i32 - 1;

/// Fixed color for task pseudo-events (not part of the palette).
pub const TASK_COLOR_HEX: &str = "#1c70e6ff";

/// Palette indices a user may pick from.
pub fn selectable_indices() -> impl Iterator<Item = i32> {
    DEFAULT_COLOR_INDEX..OUT_OF_RANGE_COLOR_INDEX
}

/// Map a palette index to the remote color.
///
/// Indices below 0 or at/above the sentinel fall back to the default entry.
pub fn palette_index_to_remote_color(index: i32) -> PaletteColor {
    if !(0..OUT_OF_RANGE_COLOR_INDEX).contains(&index) {
        warn!(index, "color index out of range, using default color");
        return PALETTE[DEFAULT_COLOR_INDEX as usize];
    }
    PALETTE[index as usize]
}

/// Map a remote color (either its color id or its hex value) back to a
/// palette index. Missing or unknown colors map to the default index.
pub fn remote_color_to_palette_index(color: Option<&str>) -> i32 {
    let Some(color) = color else {
        return DEFAULT_COLOR_INDEX;
    };

    PALETTE
        .iter()
        .position(|entry| entry.color_id == color || entry.hex.eq_ignore_ascii_case(color))
        .map(|i| i as i32)
        .unwrap_or(DEFAULT_COLOR_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_indices_map_to_default() {
        let default = palette_index_to_remote_color(DEFAULT_COLOR_INDEX);
        for index in [-5, -1, OUT_OF_RANGE_COLOR_INDEX, OUT_OF_RANGE_COLOR_INDEX + 1, 100] {
            assert_eq!(palette_index_to_remote_color(index), default);
        }
    }

    #[test]
    fn valid_indices_round_trip() {
        for index in selectable_indices() {
            let color = palette_index_to_remote_color(index);
            assert_eq!(remote_color_to_palette_index(Some(color.color_id)), index);
            assert_eq!(remote_color_to_palette_index(Some(color.hex)), index);
        }
    }

    #[test]
    fn unknown_or_missing_color_is_default() {
        assert_eq!(remote_color_to_palette_index(None), DEFAULT_COLOR_INDEX);
        assert_eq!(remote_color_to_palette_index(Some("#abcdef")), DEFAULT_COLOR_INDEX);
        assert_eq!(remote_color_to_palette_index(Some("")), DEFAULT_COLOR_INDEX);
    }

    #[test]
    fn sentinel_is_not_selectable() {
        assert!(selectable_indices().all(|i| i != OUT_OF_RANGE_COLOR_INDEX));
        assert_eq!(selectable_indices().count(), 12);
    }
}
