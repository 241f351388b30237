//! # Omnivore Tile
//!
//! Tiling pane manager: nested splits, edge sidebars with popups,
//! drag-to-dock, and layouts saved as JSON.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                     TileManager                       │
//! │ ┌─────────┐ ┌──────────────────────────────────────┐ │
//! │ │ Sidebar │ │              SplitTree               │ │
//! │ │  (left) │ │  ┌────────┐ │ ┌────────────────────┐ │ │
//! │ │         │ │  │  Leaf  │ │ │       Leaf         │ │ │
//! │ │  label  │ │  │        │ │ ├────────────────────┤ │ │
//! │ │  label  │ │  │        │ │ │       Leaf         │ │ │
//! │ └─────────┘ │  └────────┘ │ └────────────────────┘ │ │
//! │             └──────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The manager never draws anything. A [`HostAdapter`] receives widget
//! bounds, visibility and parentage after each change; [`HeadlessHost`]
//! records them for tests and the command-line tool.
//!
//! ## Learning: Splitting an `impl` Across Files
//!
//! A type's methods don't have to live in one `impl` block or one file.
//! `TileManager` is declared in `manager.rs`, while focus handling, docking
//! and layout persistence each add their own `impl<H: HostAdapter>
//! TileManager<H>` block in their own module. Private fields marked
//! `pub(crate)` stay visible to all of them.

pub mod client;
pub mod config;
pub mod dock;
pub mod focus;
pub mod geometry;
pub mod host;
pub mod layout;
pub mod manager;
pub mod sidebar;
pub mod tree;

pub use client::{Client, ClientId, ClientOptions};
pub use config::{DockTargetMode, TileConfig};
pub use dock::{DockRect, DockTarget, DragSource, DropOutcome};
pub use focus::Focus;
pub use geometry::{Direction, Rect, Side, Size};
pub use host::{HeadlessHost, HostAdapter, Parent};
pub use layout::{LayoutNode, LeafLayout, SidebarLayout, SplitLayout, TileLayout};
pub use manager::{Location, TileEvent, TileManager};
pub use sidebar::{MenuItem, Sidebar};
pub use tree::{NodeId, SplitTree};

/// Result type for tile operations
pub type TileResult<T> = Result<T, TileError>;

/// Errors that can occur in tile operations
#[derive(Debug, thiserror::Error)]
pub enum TileError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not a leaf")]
    NotALeaf(NodeId),

    #[error("Node {0} is not a split")]
    NotASplit(NodeId),

    #[error("Sizer {index} out of range for {children} children")]
    SizerOutOfRange { index: usize, children: usize },

    #[error("Client not found: {0}")]
    ClientNotFound(ClientId),

    #[error("Client {0} is already placed")]
    ClientPlaced(ClientId),

    #[error("Client {0} appears more than once in layout")]
    DuplicateClient(ClientId),

    #[error("No sidebar on the {0} side")]
    NoSidebar(Side),

    #[error("Invalid layout: {0}")]
    Layout(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
