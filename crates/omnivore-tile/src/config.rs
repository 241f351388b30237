//! Tile manager configuration.
//!
//! Lives in its own `[tile]` table of the editor's config file:
//!
//! ```toml
//! [tile]
//! sizer_thickness = 6
//! dock_target_mode = "split"
//! default_sidebar_side = "right"
//! ```

use serde::{Deserialize, Serialize};

use crate::geometry::Side;

/// What a drop on a leaf does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockTargetMode {
    /// One target covering the whole leaf; dropping swaps clients
    #[default]
    Swap,
    /// Four edge targets; dropping splits the leaf on that edge
    Split,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileConfig {
    /// Width of the draggable bar between split children
    pub sizer_thickness: i32,

    /// Height of a leaf's title bar
    pub title_bar_height: i32,

    /// Padding around sidebar labels
    pub sidebar_margin: i32,

    /// Height of the label font, used for sidebar thickness
    pub font_height: i32,

    /// Smallest ratio a child may be resized to
    pub min_ratio: f64,

    pub dock_target_mode: DockTargetMode,

    /// Sidebar used by `minimize_leaf` when none exists yet
    pub default_sidebar_side: Side,
}

impl Default for TileConfig {
    fn default() -> Self {
        Self {
            sizer_thickness: 5,
            title_bar_height: 20,
            sidebar_margin: 4,
            font_height: 14,
            min_ratio: 0.02,
            dock_target_mode: DockTargetMode::Swap,
            default_sidebar_side: Side::Left,
        }
    }
}

impl TileConfig {
    /// Thickness of a sidebar strip.
    pub fn sidebar_thickness(&self) -> i32 {
        2 * self.sidebar_margin + self.font_height
    }
}
