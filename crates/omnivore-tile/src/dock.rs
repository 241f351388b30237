//! Drag-to-dock.
//!
//! Dragging a leaf's title bar or a sidebar label computes a list of drop
//! rectangles. The first rectangle under the pointer wins, so the order
//! matters: sidebar items, then strips for sidebars that do not exist yet,
//! then the leaves of the main tree.

use crate::client::ClientId;
use crate::config::DockTargetMode;
use crate::geometry::{Rect, Side};
use crate::host::HostAdapter;
use crate::manager::{Location, TileManager};
use crate::sidebar::missing_sidebar_rect;
use crate::tree::NodeId;
use crate::{TileError, TileResult};

/// What is being dragged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Leaf(NodeId),
    MenuItem(ClientId),
}

/// Where a drop lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockTarget {
    Leaf(NodeId),
    MenuItem(ClientId),
    /// Creates the sidebar on this side
    MissingSidebar(Side),
}

/// A drop rectangle. `target` is `None` over the dragged item itself, so
/// dropping there does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DockRect {
    pub target: Option<DockTarget>,
    pub side: Option<Side>,
    pub rect: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Nothing,
    Swapped,
    Split,
    MovedToSidebar,
}

#[derive(Debug)]
pub(crate) struct DragState {
    source: DragSource,
    rects: Vec<DockRect>,
    hovered: Option<usize>,
}

impl<H: HostAdapter> TileManager<H> {
    /// Drop rectangles for dragging `source`, in priority order.
    pub fn dock_rectangles(&self, source: DragSource) -> Vec<DockRect> {
        let mut rects = Vec::new();

        for sidebar in &self.sidebars {
            for (index, item) in sidebar.items().iter().enumerate() {
                let target = (source != DragSource::MenuItem(item.client))
                    .then_some(DockTarget::MenuItem(item.client));
                rects.extend(
                    sidebar
                        .dock_rectangles(index)
                        .into_iter()
                        .map(|(side, rect)| DockRect {
                            target,
                            side: Some(side),
                            rect,
                        }),
                );
            }
        }

        for side in Side::ALL {
            if self.sidebar(side).is_none() {
                rects.push(DockRect {
                    target: Some(DockTarget::MissingSidebar(side)),
                    side: Some(side),
                    rect: missing_sidebar_rect(side, self.window, self.usable, &self.config),
                });
            }
        }

        for leaf in self.tree.leaves() {
            let Some(r) = self.tree.rect(leaf) else {
                continue;
            };
            if source == DragSource::Leaf(leaf) {
                rects.push(DockRect {
                    target: None,
                    side: None,
                    rect: r,
                });
                continue;
            }
            match self.config.dock_target_mode {
                DockTargetMode::Swap => rects.push(DockRect {
                    target: Some(DockTarget::Leaf(leaf)),
                    side: None,
                    rect: r,
                }),
                DockTargetMode::Split => {
                    let (qw, qh) = (r.width / 4, r.height / 4);
                    let edges = [
                        (Side::Left, Rect::new(r.x, r.y, qw, r.height)),
                        (Side::Right, Rect::new(r.right() - qw, r.y, qw, r.height)),
                        (Side::Top, Rect::new(r.x + qw, r.y, r.width - 2 * qw, qh)),
                        (Side::Bottom, Rect::new(r.x + qw, r.bottom() - qh, r.width - 2 * qw, qh)),
                    ];
                    rects.extend(edges.into_iter().map(|(side, rect)| DockRect {
                        target: Some(DockTarget::Leaf(leaf)),
                        side: Some(side),
                        rect,
                    }));
                }
            }
        }
        rects
    }

    /// Starts dragging `source`, closing any open popup.
    pub fn start_drag(&mut self, source: DragSource) -> TileResult<()> {
        match source {
            DragSource::Leaf(leaf) => {
                self.tree.node(leaf)?;
                if !self.tree.is_leaf(leaf) {
                    return Err(TileError::NotALeaf(leaf));
                }
            }
            DragSource::MenuItem(client) => {
                if !self.sidebars.iter().any(|s| s.contains(client)) {
                    return Err(TileError::ClientNotFound(client));
                }
            }
        }
        self.force_clear_sidebar();
        tracing::debug!("drag: start {:?}", source);
        self.drag = Some(DragState {
            source,
            rects: self.dock_rectangles(source),
            hovered: None,
        });
        Ok(())
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Pointer moved during a drag. Returns the rectangle to highlight.
    pub fn drag_to(&mut self, x: i32, y: i32) -> Option<&DockRect> {
        let drag = self.drag.as_mut()?;
        drag.hovered = drag.rects.iter().position(|r| r.rect.contains(x, y));
        drag.hovered.and_then(|i| drag.rects.get(i))
    }

    pub fn cancel_drag(&mut self) {
        if self.drag.take().is_some() {
            tracing::debug!("drag: cancelled");
        }
    }

    /// Drops the dragged item at the pointer position.
    pub fn finish_drag(&mut self, x: i32, y: i32) -> TileResult<DropOutcome> {
        let Some(drag) = self.drag.take() else {
            return Ok(DropOutcome::Nothing);
        };
        let Some(hit) = drag.rects.iter().find(|r| r.rect.contains(x, y)) else {
            return Ok(DropOutcome::Nothing);
        };
        match hit.target {
            Some(target) => self.dock(drag.source, target, hit.side),
            None => Ok(DropOutcome::Nothing),
        }
    }

    /// Moves `source` to `target`.
    ///
    /// On a leaf with no side the two clients swap places; with a side the
    /// leaf is split there. On a sidebar item the client is inserted before
    /// or after it, and on a missing sidebar that sidebar is created.
    pub fn dock(&mut self, source: DragSource, target: DockTarget, side: Option<Side>) -> TileResult<DropOutcome> {
        if Self::same_item(source, target) {
            return Ok(DropOutcome::Nothing);
        }
        let moved = self.source_client(source)?;
        self.force_clear_sidebar();
        tracing::debug!("dock: {:?} onto {:?} ({:?})", source, target, side);

        let outcome = match (target, side) {
            (DockTarget::Leaf(leaf), None) => {
                let displaced = self.tree.client_of(leaf).ok_or(TileError::NotALeaf(leaf))?;
                match source {
                    DragSource::Leaf(from) => self.tree.swap(from, leaf)?,
                    DragSource::MenuItem(client) => {
                        self.tree.set_client(leaf, client)?;
                        if let Some(sidebar) = self.sidebars.iter_mut().find(|s| s.contains(client)) {
                            sidebar.replace(client, displaced);
                        }
                    }
                }
                self.sync_widget(displaced);
                DropOutcome::Swapped
            }
            (DockTarget::Leaf(leaf), Some(side)) => {
                if !self.tree.is_leaf(leaf) {
                    return Err(TileError::NotALeaf(leaf));
                }
                self.take_source(source, moved)?;
                self.tree.split(leaf, side, moved)?;
                DropOutcome::Split
            }
            (DockTarget::MenuItem(anchor), side) => {
                if !matches!(self.locate(anchor), Some(Location::Sidebar { .. })) {
                    return Err(TileError::ClientNotFound(anchor));
                }
                self.take_source(source, moved)?;
                // the source may have sat before the anchor in the same sidebar
                let Some(Location::Sidebar { side: bar, index }) = self.locate(anchor) else {
                    return Err(TileError::ClientNotFound(anchor));
                };
                let after = side.is_some_and(|s| !s.is_leading());
                let at = self.use_sidebar(bar);
                self.sidebars[at].insert(if after { index + 1 } else { index }, moved);
                DropOutcome::MovedToSidebar
            }
            (DockTarget::MissingSidebar(bar), _) => {
                self.take_source(source, moved)?;
                let index = self.use_sidebar(bar);
                self.sidebars[index].push(moved);
                DropOutcome::MovedToSidebar
            }
        };
        self.sync_widget(moved);
        self.layout_changed();
        Ok(outcome)
    }

    fn same_item(source: DragSource, target: DockTarget) -> bool {
        match (source, target) {
            (DragSource::Leaf(a), DockTarget::Leaf(b)) => a == b,
            (DragSource::MenuItem(a), DockTarget::MenuItem(b)) => a == b,
            _ => false,
        }
    }

    fn source_client(&self, source: DragSource) -> TileResult<ClientId> {
        match source {
            DragSource::Leaf(leaf) => self.tree.client_of(leaf).ok_or(TileError::NotALeaf(leaf)),
            DragSource::MenuItem(client) => self
                .sidebars
                .iter()
                .any(|s| s.contains(client))
                .then_some(client)
                .ok_or(TileError::ClientNotFound(client)),
        }
    }

    /// Removes the dragged client from where it was.
    fn take_source(&mut self, source: DragSource, client: ClientId) -> TileResult<()> {
        match source {
            DragSource::Leaf(leaf) => {
                self.detach_quietly(leaf)?;
            }
            DragSource::MenuItem(_) => {
                self.remove_from_sidebar(client);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOptions;
    use crate::config::TileConfig;
    use crate::host::HeadlessHost;

    fn manager(mode: DockTargetMode) -> (TileManager<HeadlessHost>, ClientId, ClientId) {
        let config = TileConfig {
            dock_target_mode: mode,
            ..TileConfig::default()
        };
        let mut tm = TileManager::new(HeadlessHost::new(), config);
        tm.set_window(Rect::new(0, 0, 800, 600));
        let a = tm.add("a".into(), None, ClientOptions::titled("a"));
        let b = tm.add("b".into(), None, ClientOptions::titled("b"));
        (tm, a, b)
    }

    #[test]
    fn test_rectangles_in_priority_order() {
        let (mut tm, a, _) = manager(DockTargetMode::Swap);
        let log = tm.add_to_sidebar("log".into(), None, Side::Left, ClientOptions::titled("log"));
        let leaf_a = tm.tree().find_client(a).unwrap();
        let rects = tm.dock_rectangles(DragSource::Leaf(leaf_a));

        let targets: Vec<_> = rects.iter().map(|r| r.target).collect();
        assert_eq!(targets[0], Some(DockTarget::MenuItem(log)));
        assert_eq!(targets[1], Some(DockTarget::MenuItem(log)));
        assert_eq!(targets[2], Some(DockTarget::MissingSidebar(Side::Right)));
        assert_eq!(targets[3], Some(DockTarget::MissingSidebar(Side::Top)));
        assert_eq!(targets[4], Some(DockTarget::MissingSidebar(Side::Bottom)));
        // the dragged leaf swallows drops on itself
        assert_eq!(targets[5], None);
        assert!(matches!(targets[6], Some(DockTarget::Leaf(_))));
        assert_eq!(rects.len(), 7);
    }

    #[test]
    fn test_split_mode_has_four_edges_per_leaf() {
        let (tm, a, b) = manager(DockTargetMode::Split);
        let leaf_a = tm.tree().find_client(a).unwrap();
        let leaf_b = tm.tree().find_client(b).unwrap();
        let rects: Vec<_> = tm
            .dock_rectangles(DragSource::Leaf(leaf_a))
            .into_iter()
            .filter(|r| r.target == Some(DockTarget::Leaf(leaf_b)))
            .collect();
        assert_eq!(rects.len(), 4);
        // b spans x 402..800
        assert_eq!(rects[0].rect, Rect::new(402, 0, 99, 600));
        assert_eq!(rects[1].side, Some(Side::Right));
    }

    #[test]
    fn test_drop_on_leaf_swaps() {
        let (mut tm, a, b) = manager(DockTargetMode::Swap);
        let leaf_a = tm.tree().find_client(a).unwrap();
        tm.start_drag(DragSource::Leaf(leaf_a)).unwrap();
        assert!(tm.drag_to(600, 300).is_some());
        assert_eq!(tm.finish_drag(600, 300).unwrap(), DropOutcome::Swapped);
        assert_eq!(tm.tree().client_of(leaf_a), Some(b));
        assert!(!tm.is_dragging());
    }

    #[test]
    fn test_drop_on_itself_does_nothing() {
        let (mut tm, a, _) = manager(DockTargetMode::Swap);
        let leaf_a = tm.tree().find_client(a).unwrap();
        tm.start_drag(DragSource::Leaf(leaf_a)).unwrap();
        assert_eq!(tm.finish_drag(100, 300).unwrap(), DropOutcome::Nothing);
        assert_eq!(tm.tree().client_of(leaf_a), Some(a));
    }

    #[test]
    fn test_drop_on_edge_splits() {
        let (mut tm, a, b) = manager(DockTargetMode::Split);
        let leaf_a = tm.tree().find_client(a).unwrap();
        let leaf_b = tm.tree().find_client(b).unwrap();
        tm.start_drag(DragSource::Leaf(leaf_a)).unwrap();
        // bottom quarter of b
        assert_eq!(tm.finish_drag(600, 550).unwrap(), DropOutcome::Split);

        assert_eq!(tm.tree().leaf_count(), 2);
        let sub = tm.tree().children(tm.tree().root()).unwrap()[0];
        assert_eq!(tm.tree().children(sub).unwrap()[0], leaf_b);
        assert_eq!(tm.locate(a).map(|l| matches!(l, Location::Leaf(_))), Some(true));
    }

    #[test]
    fn test_drop_on_missing_sidebar_creates_it() {
        let (mut tm, a, _) = manager(DockTargetMode::Swap);
        let leaf_a = tm.tree().find_client(a).unwrap();
        tm.start_drag(DragSource::Leaf(leaf_a)).unwrap();
        assert_eq!(tm.finish_drag(795, 300).unwrap(), DropOutcome::MovedToSidebar);
        assert_eq!(tm.locate(a), Some(Location::Sidebar { side: Side::Right, index: 0 }));
        assert_eq!(tm.tree().leaf_count(), 1);
    }

    #[test]
    fn test_menu_item_swaps_into_leaf() {
        let (mut tm, a, _) = manager(DockTargetMode::Swap);
        let log = tm.add_to_sidebar("log".into(), None, Side::Left, ClientOptions::titled("log"));
        let leaf_a = tm.tree().find_client(a).unwrap();

        let outcome = tm.dock(DragSource::MenuItem(log), DockTarget::Leaf(leaf_a), None).unwrap();
        assert_eq!(outcome, DropOutcome::Swapped);
        assert_eq!(tm.tree().client_of(leaf_a), Some(log));
        assert_eq!(tm.locate(a), Some(Location::Sidebar { side: Side::Left, index: 0 }));
        assert!(tm.host().is_visible("log"));
        assert!(!tm.host().is_visible("a"));
    }

    #[test]
    fn test_insert_after_menu_item() {
        let (mut tm, a, _) = manager(DockTargetMode::Swap);
        let log = tm.add_to_sidebar("log".into(), None, Side::Top, ClientOptions::titled("log"));
        let leaf_a = tm.tree().find_client(a).unwrap();

        tm.dock(DragSource::Leaf(leaf_a), DockTarget::MenuItem(log), Some(Side::Right))
            .unwrap();
        let order: Vec<_> = tm.sidebar(Side::Top).unwrap().clients().collect();
        assert_eq!(order, vec![log, a]);
    }
}
