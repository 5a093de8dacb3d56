//! Panel geometry
//!
//! A display is a rectangular tiling of sub-panels. Every sub-panel is
//! [`PANEL_HEIGHT`] dots tall and one of the controller's supported widths
//! wide, and is addressed independently on the bus.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Rows per sub-panel; one data byte carries one column of seven dots
pub const PANEL_HEIGHT: u32 = 7;

/// Highest usable bus address; higher values would collide with framing bytes
pub const MAX_ADDRESS: u8 = 0x7F;

/// Geometry validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("layout has no sub-panels")]
    EmptyLayout,

    #[error("layout row {row} has {found} sub-panels, expected {expected}")]
    RaggedLayout {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("sub-panel address {0} appears more than once")]
    DuplicateAddress(u8),

    #[error("sub-panel address {0:#04x} is above 0x7f")]
    InvalidAddress(u8),

    #[error("unsupported sub-panel width {0} (expected 28, 56 or 112)")]
    UnsupportedWidth(u32),
}

/// Sub-panel widths the controller protocol has commands for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PanelWidth {
    #[default]
    W28,
    W56,
    W112,
}

impl PanelWidth {
    /// Number of dot columns
    pub fn columns(self) -> u32 {
        match self {
            PanelWidth::W28 => 28,
            PanelWidth::W56 => 56,
            PanelWidth::W112 => 112,
        }
    }
}

impl TryFrom<u32> for PanelWidth {
    type Error = GeometryError;

    fn try_from(columns: u32) -> Result<Self, Self::Error> {
        match columns {
            28 => Ok(PanelWidth::W28),
            56 => Ok(PanelWidth::W56),
            112 => Ok(PanelWidth::W112),
            other => Err(GeometryError::UnsupportedWidth(other)),
        }
    }
}

impl From<PanelWidth> for u32 {
    fn from(width: PanelWidth) -> Self {
        width.columns()
    }
}

impl fmt::Display for PanelWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns())
    }
}

/// Arrangement of sub-panel addresses, top row first
///
/// Every row has the same number of sub-panels and addresses are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>", into = "Vec<Vec<u8>>")]
pub struct Layout {
    rows: Vec<Vec<u8>>,
}

impl Layout {
    /// Validate and build a layout
    pub fn new(rows: Vec<Vec<u8>>) -> Result<Self, GeometryError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        if expected == 0 {
            return Err(GeometryError::EmptyLayout);
        }

        let mut seen = HashSet::new();
        for (row, addresses) in rows.iter().enumerate() {
            if addresses.len() != expected {
                return Err(GeometryError::RaggedLayout {
                    row,
                    expected,
                    found: addresses.len(),
                });
            }
            for &address in addresses {
                if address > MAX_ADDRESS {
                    return Err(GeometryError::InvalidAddress(address));
                }
                if !seen.insert(address) {
                    return Err(GeometryError::DuplicateAddress(address));
                }
            }
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> usize {
        self.rows[0].len()
    }

    /// Total number of sub-panels
    pub fn len(&self) -> usize {
        self.rows() * self.columns()
    }
}

impl Default for Layout {
    /// Four rows of three 28-column panels: an 84 × 28 board
    fn default() -> Self {
        Self {
            rows: vec![vec![1, 2, 3], vec![4, 5, 6], vec![7, 8, 9], vec![10, 11, 12]],
        }
    }
}

impl TryFrom<Vec<Vec<u8>>> for Layout {
    type Error = GeometryError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Layout> for Vec<Vec<u8>> {
    fn from(layout: Layout) -> Self {
        layout.rows
    }
}

/// One sub-panel and the region of the display it covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubPanel {
    /// Bus address
    pub address: u8,
    /// Leftmost display column covered
    pub x: u32,
    /// Topmost display row covered
    pub y: u32,
}

/// Immutable description of the whole display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelGeometry {
    layout: Layout,
    panel_width: PanelWidth,
    mirrored: bool,
}

impl PanelGeometry {
    pub fn new(layout: Layout, panel_width: PanelWidth, mirrored: bool) -> Self {
        Self {
            layout,
            panel_width,
            mirrored,
        }
    }

    /// Display width in dots
    pub fn width(&self) -> u32 {
        self.layout.columns() as u32 * self.panel_width.columns()
    }

    /// Display height in dots
    pub fn height(&self) -> u32 {
        self.layout.rows() as u32 * PANEL_HEIGHT
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn panel_width(&self) -> PanelWidth {
        self.panel_width
    }

    /// Whether the image is flipped horizontally before it is sent
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Sub-panels in bus order: layout rows top to bottom, left to right
    pub fn panels(&self) -> impl Iterator<Item = SubPanel> + '_ {
        let width = self.panel_width.columns();
        self.layout.rows.iter().enumerate().flat_map(move |(row, addresses)| {
            addresses
                .iter()
                .enumerate()
                .map(move |(column, &address)| SubPanel {
                    address,
                    x: column as u32 * width,
                    y: row as u32 * PANEL_HEIGHT,
                })
        })
    }
}
