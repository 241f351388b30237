//! Saving and restoring layouts as JSON.
//!
//! ```json
//! {
//!     "sidebars": [
//!         {"side": 0, "views": [{"child_uuid": "…", "show_title": true, "use_close_button": true}]}
//!     ],
//!     "tile_manager": {
//!         "direction": 0,
//!         "ratio_in_parent": 1.0,
//!         "views": [
//!             {"child_uuid": "…", "ratio_in_parent": 0.5, "show_title": true, "use_close_button": true},
//!             {"direction": 1, "ratio_in_parent": 0.5, "views": [{"child_uuid": "…", "ratio_in_parent": 0.5}, …]}
//!         ]
//!     }
//! }
//! ```
//!
//! Restoring keeps every client whose UUID appears in the layout, leaves an
//! empty placeholder for UUIDs nobody knows, and closes the rest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::{Client, ClientId};
use crate::focus::{FocusState, PopupState};
use crate::geometry::{Direction, Side, side_code};
use crate::host::HostAdapter;
use crate::manager::TileManager;
use crate::sidebar::Sidebar;
use crate::tree::SplitTree;
use crate::{TileError, TileResult};

/// A whole saved layout: the split tree plus any sidebars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayout {
    pub tile_manager: SplitLayout,
    #[serde(default)]
    pub sidebars: Vec<SidebarLayout>,
}

/// Either shape a node of the split tree can take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutNode {
    Split(SplitLayout),
    Leaf(LeafLayout),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitLayout {
    pub direction: Direction,
    pub ratio_in_parent: f64,
    pub views: Vec<LayoutNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafLayout {
    pub child_uuid: ClientId,
    #[serde(default = "default_true")]
    pub show_title: bool,
    #[serde(default = "default_true")]
    pub use_close_button: bool,
    /// Absent for sidebar items
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio_in_parent: Option<f64>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarLayout {
    #[serde(with = "side_code")]
    pub side: Side,
    pub views: Vec<LeafLayout>,
}

impl TileLayout {
    /// Parses a layout document.
    pub fn parse(text: &str) -> TileResult<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Reads a layout from a JSON value. Session files sometimes hold the
    /// layout as a JSON string; that string is parsed in turn.
    pub fn from_value(value: Value) -> TileResult<Self> {
        let value = match value {
            Value::String(text) => serde_json::from_str(&text)?,
            other => other,
        };
        if value.get("tile_manager").is_none() {
            return Err(TileError::Layout("missing key 'tile_manager'".to_string()));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes the layout. Pretty output has sorted keys and a
    /// four-space indent.
    pub fn to_json(&self, pretty: bool) -> TileResult<String> {
        if !pretty {
            return Ok(serde_json::to_string(self)?);
        }
        // Value objects iterate in key order
        let value = serde_json::to_value(self)?;
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|err| TileError::Layout(err.to_string()))
    }

    /// Every UUID in the layout, tree first, then sidebars in order.
    pub fn client_ids(&self) -> Vec<ClientId> {
        fn walk(node: &LayoutNode, out: &mut Vec<ClientId>) {
            match node {
                LayoutNode::Leaf(leaf) => out.push(leaf.child_uuid),
                LayoutNode::Split(split) => split.views.iter().for_each(|v| walk(v, out)),
            }
        }
        let mut ids = Vec::new();
        self.tile_manager.views.iter().for_each(|v| walk(v, &mut ids));
        ids.extend(self.sidebars.iter().flat_map(|s| s.views.iter().map(|v| v.child_uuid)));
        ids
    }

    fn leaves(&self) -> Vec<&LeafLayout> {
        fn walk<'a>(node: &'a LayoutNode, out: &mut Vec<&'a LeafLayout>) {
            match node {
                LayoutNode::Leaf(leaf) => out.push(leaf),
                LayoutNode::Split(split) => split.views.iter().for_each(|v| walk(v, out)),
            }
        }
        let mut leaves = Vec::new();
        self.tile_manager.views.iter().for_each(|v| walk(v, &mut leaves));
        leaves.extend(self.sidebars.iter().flat_map(|s| s.views.iter()));
        leaves
    }
}

impl<H: HostAdapter> TileManager<H> {
    /// Snapshot of the current layout.
    pub fn calc_layout(&self) -> TileLayout {
        TileLayout {
            tile_manager: self.tree.to_layout(|id| self.leaf_layout(id)),
            sidebars: self
                .sidebars
                .iter()
                .map(|sidebar| SidebarLayout {
                    side: sidebar.side(),
                    views: sidebar.clients().map(|id| self.leaf_layout(id)).collect(),
                })
                .collect(),
        }
    }

    pub fn calc_layout_json(&self, pretty: bool) -> TileResult<String> {
        self.calc_layout().to_json(pretty)
    }

    fn leaf_layout(&self, id: ClientId) -> LeafLayout {
        let client = self.clients.get(&id);
        LeafLayout {
            child_uuid: id,
            show_title: client.is_none_or(|c| c.show_title),
            use_close_button: client.is_none_or(|c| c.use_close_button),
            ratio_in_parent: None,
        }
    }

    /// Replaces the current layout with `layout`.
    ///
    /// Clients already known to the manager, placed or waiting in the
    /// hiding space, are matched by UUID. Unknown UUIDs become empty
    /// placeholders. Known clients the layout does not mention are closed.
    /// On error the current layout is left untouched.
    pub fn restore_layout(&mut self, layout: &TileLayout) -> TileResult<()> {
        let mut seen = HashSet::new();
        for id in layout.client_ids() {
            if !seen.insert(id) {
                return Err(TileError::DuplicateClient(id));
            }
        }

        let mut tree = SplitTree::from_layout(&layout.tile_manager)?;
        let mut sidebars: Vec<Sidebar> = Vec::new();
        for entry in &layout.sidebars {
            if entry.views.is_empty() {
                continue;
            }
            if sidebars.iter().any(|s| s.side() == entry.side) {
                return Err(TileError::Layout(format!("two sidebars on the {} side", entry.side)));
            }
            let mut sidebar = Sidebar::new(entry.side);
            for view in &entry.views {
                sidebar.push(view.child_uuid);
            }
            sidebars.push(sidebar);
        }

        // Nothing can fail past this point
        self.force_clear_sidebar();
        self.cancel_drag();

        if tree.is_empty() {
            let placeholder = ClientId::new();
            tree.reset(placeholder);
            seen.insert(placeholder);
            self.insert_placeholder(placeholder);
        }

        let stale: Vec<ClientId> = self
            .clients
            .keys()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        for id in stale {
            if self.clients.get(&id).is_some_and(Client::is_empty) {
                self.clients.remove(&id);
            } else {
                self.destroy_client(id);
            }
        }

        for leaf in layout.leaves() {
            let client = self.clients.entry(leaf.child_uuid).or_insert_with(|| {
                tracing::warn!("restore: no client for {}, leaving it empty", leaf.child_uuid);
                Client::placeholder(leaf.child_uuid)
            });
            client.show_title = leaf.show_title;
            client.use_close_button = leaf.use_close_button;
        }

        self.tree = tree;
        self.sidebars = sidebars;
        self.focus = FocusState::default();
        self.popup = PopupState::default();

        let ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.sync_widget(id);
        }
        tracing::info!(
            "restored layout: {} leaves, {} sidebars",
            self.tree.leaf_count(),
            self.sidebars.len()
        );
        self.layout_changed();
        Ok(())
    }

    /// Closes every client and sidebar, leaving one empty leaf.
    pub fn remove_all(&mut self) {
        self.force_clear_sidebar();
        self.cancel_drag();
        let ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.destroy_client(id);
        }
        self.sidebars.clear();
        let placeholder = ClientId::new();
        self.insert_placeholder(placeholder);
        self.tree.reset(placeholder);
        self.focus = FocusState::default();
        self.layout_changed();
    }
}
