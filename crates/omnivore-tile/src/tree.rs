//! The split tree.
//!
//! ## Learning: Arenas Instead of Parent Pointers
//!
//! A tree whose nodes point both down (children) and up (parent) is awkward
//! with plain ownership. Here every node lives in one `Vec` and refers to
//! others by [`NodeId`], a plain index. Moving a subtree is just rewriting a
//! few indexes; nothing is reallocated or reborrowed.
//!
//! Removed slots are left as `None` and never reused, so a stale `NodeId`
//! can only miss, never alias a different node.
//!
//! ## Ratios
//!
//! Each child stores `ratio` relative to its parent split. Siblings sum to
//! 1, so a node's share of the whole window is the product of the ratios on
//! its path to the root ([`SplitTree::effective_share`]).

use std::fmt;

use crate::client::ClientId;
use crate::geometry::{Direction, Rect, Side};
use crate::layout::{LayoutNode, LeafLayout, SplitLayout};
use crate::{TileError, TileResult};

/// Handle to a node in a [`SplitTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Split {
        direction: Direction,
        children: Vec<NodeId>,
    },
    Leaf {
        client: ClientId,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    /// Share of the parent split
    pub ratio: f64,
    /// Last geometry computed by [`SplitTree::layout`]
    pub rect: Rect,
    /// Sizer after this node, absent for the last child
    pub sizer: Option<Rect>,
    pub kind: NodeKind,
}

impl Node {
    fn leaf(parent: Option<NodeId>, ratio: f64, client: ClientId) -> Self {
        Self {
            parent,
            ratio,
            rect: Rect::default(),
            sizer: None,
            kind: NodeKind::Leaf { client },
        }
    }

    fn split(parent: Option<NodeId>, ratio: f64, direction: Direction, children: Vec<NodeId>) -> Self {
        Self {
            parent,
            ratio,
            rect: Rect::default(),
            sizer: None,
            kind: NodeKind::Split { direction, children },
        }
    }
}

/// A root split with nested splits and leaves.
#[derive(Debug, Clone)]
pub struct SplitTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
}

impl SplitTree {
    /// Root split of `direction` holding one leaf.
    pub fn new(direction: Direction, client: ClientId) -> Self {
        let mut tree = Self::empty(direction);
        tree.reset(client);
        tree
    }

    /// Root split with no children.
    pub fn empty(direction: Direction) -> Self {
        Self {
            nodes: vec![Some(Node::split(None, 1.0, direction, Vec::new()))],
            root: NodeId(0),
        }
    }

    /// Replaces everything under the root with a single leaf.
    pub fn reset(&mut self, client: ClientId) -> NodeId {
        let root = self.root;
        let old: Vec<NodeId> = self.children(root).map(<[_]>::to_vec).unwrap_or_default();
        for child in old {
            self.free_subtree(child);
        }
        let leaf = self.alloc(Node::leaf(Some(root), 1.0, client));
        if let Ok(children) = self.children_mut(root) {
            children.push(leaf);
        }
        leaf
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn node(&self, id: NodeId) -> TileResult<&Node> {
        self.get(id).ok_or(TileError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> TileResult<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(TileError::NodeNotFound(id))
    }

    pub fn is_leaf(&self, id: NodeId) -> bool {
        matches!(self.get(id), Some(Node { kind: NodeKind::Leaf { .. }, .. }))
    }

    pub fn client_of(&self, leaf: NodeId) -> Option<ClientId> {
        match self.get(leaf)?.kind {
            NodeKind::Leaf { client } => Some(client),
            NodeKind::Split { .. } => None,
        }
    }

    pub fn direction(&self, split: NodeId) -> Option<Direction> {
        match self.get(split)?.kind {
            NodeKind::Split { direction, .. } => Some(direction),
            NodeKind::Leaf { .. } => None,
        }
    }

    pub fn children(&self, split: NodeId) -> Option<&[NodeId]> {
        match &self.get(split)?.kind {
            NodeKind::Split { children, .. } => Some(children),
            NodeKind::Leaf { .. } => None,
        }
    }

    fn children_mut(&mut self, split: NodeId) -> TileResult<&mut Vec<NodeId>> {
        match &mut self.node_mut(split)?.kind {
            NodeKind::Split { children, .. } => Ok(children),
            NodeKind::Leaf { .. } => Err(TileError::NotASplit(split)),
        }
    }

    pub fn ratio(&self, id: NodeId) -> Option<f64> {
        self.get(id).map(|node| node.ratio)
    }

    pub fn rect(&self, id: NodeId) -> Option<Rect> {
        self.get(id).map(|node| node.rect)
    }

    /// Leaves in depth-first order.
    pub fn leaves(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_leaves(self.root, &mut found);
        found
    }

    fn collect_leaves(&self, id: NodeId, found: &mut Vec<NodeId>) {
        match self.get(id).map(|node| &node.kind) {
            Some(NodeKind::Leaf { .. }) => found.push(id),
            Some(NodeKind::Split { children, .. }) => {
                for &child in children {
                    self.collect_leaves(child, found);
                }
            }
            None => {}
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_none_or(<[_]>::is_empty)
    }

    pub fn find_client(&self, client: ClientId) -> Option<NodeId> {
        self.leaves().into_iter().find(|&leaf| self.client_of(leaf) == Some(client))
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }

    fn free_subtree(&mut self, id: NodeId) {
        if let Some(children) = self.children(id).map(<[_]>::to_vec) {
            for child in children {
                self.free_subtree(child);
            }
        }
        if let Some(slot) = self.nodes.get_mut(id.0) {
            *slot = None;
        }
    }

    fn parent_of(&self, id: NodeId) -> TileResult<NodeId> {
        self.node(id)?.parent.ok_or(TileError::NodeNotFound(id))
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> TileResult<usize> {
        self.children(parent)
            .and_then(|children| children.iter().position(|&c| c == child))
            .ok_or(TileError::NodeNotFound(child))
    }

    fn require_leaf(&self, id: NodeId) -> TileResult<ClientId> {
        self.node(id)?;
        self.client_of(id).ok_or(TileError::NotALeaf(id))
    }

    // ==================== Structure ====================

    /// Puts `client` in a new leaf on `side` of `leaf`.
    ///
    /// When the parent already runs in that direction the new leaf becomes a
    /// sibling and the two share the old leaf's ratio. Otherwise `leaf` is
    /// wrapped in a new split of the opposite direction that inherits its
    /// ratio, and the halving happens inside that split.
    pub fn split(&mut self, leaf: NodeId, side: Side, client: ClientId) -> TileResult<NodeId> {
        self.require_leaf(leaf)?;
        let parent = self.parent_of(leaf)?;
        let same = self.direction(parent) == Some(side.direction());
        tracing::debug!("split {} on {} (same direction: {})", leaf, side, same);
        if same {
            self.split_same(parent, leaf, side, client)
        } else {
            self.split_opposite(parent, leaf, side, client)
        }
    }

    fn split_same(&mut self, parent: NodeId, leaf: NodeId, side: Side, client: ClientId) -> TileResult<NodeId> {
        let index = self.child_index(parent, leaf)?;
        let insert = if side.is_leading() { index } else { index + 1 };
        let node = self.node_mut(leaf)?;
        node.ratio /= 2.0;
        let ratio = node.ratio;
        let new_leaf = self.alloc(Node::leaf(Some(parent), ratio, client));
        self.children_mut(parent)?.insert(insert, new_leaf);
        Ok(new_leaf)
    }

    fn split_opposite(&mut self, parent: NodeId, leaf: NodeId, side: Side, client: ClientId) -> TileResult<NodeId> {
        let index = self.child_index(parent, leaf)?;
        let ratio = self.node(leaf)?.ratio;
        let sub = self.alloc(Node::split(Some(parent), ratio, side.direction(), vec![leaf]));
        self.children_mut(parent)?[index] = sub;
        let node = self.node_mut(leaf)?;
        node.parent = Some(sub);
        node.ratio = 1.0;
        self.split_same(sub, leaf, side, client)
    }

    /// Removes `leaf` and returns its client.
    ///
    /// With three or more siblings left over, the removed ratio goes to the
    /// larger neighbour. A split left with one child is replaced by that
    /// child, which inherits the split's ratio. The root is never replaced;
    /// it may end up with no children at all.
    pub fn detach(&mut self, leaf: NodeId) -> TileResult<ClientId> {
        let client = self.require_leaf(leaf)?;
        let parent = self.parent_of(leaf)?;
        let index = self.child_index(parent, leaf)?;
        let removed = self.node(leaf)?.ratio;
        tracing::debug!("detach {} (client {}) from {}", leaf, client, parent);

        let children = self.children_mut(parent)?;
        children.remove(index);
        let remaining = children.clone();
        self.nodes[leaf.0] = None;

        match remaining.len() {
            0 => {}
            1 => self.collapse(parent, remaining[0])?,
            len => {
                let bigger_left = index > 0
                    && index < len
                    && self.ratio(remaining[index - 1]) > self.ratio(remaining[index]);
                let target = if bigger_left { index - 1 } else { index.min(len - 1) };
                self.node_mut(remaining[target])?.ratio += removed;
            }
        }
        Ok(client)
    }

    fn collapse(&mut self, split: NodeId, only: NodeId) -> TileResult<()> {
        let Some(grand) = self.node(split)?.parent else {
            self.node_mut(only)?.ratio = 1.0;
            return Ok(());
        };
        let split_ratio = self.node(split)?.ratio;
        let index = self.child_index(grand, split)?;
        self.children_mut(grand)?[index] = only;
        let node = self.node_mut(only)?;
        node.parent = Some(grand);
        node.ratio = split_ratio;
        self.nodes[split.0] = None;
        tracing::debug!("collapsed {} into {}", split, grand);
        Ok(())
    }

    /// Exchanges the clients of two leaves.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> TileResult<()> {
        let client_a = self.require_leaf(a)?;
        let client_b = self.require_leaf(b)?;
        self.set_client(a, client_b)?;
        self.set_client(b, client_a)?;
        tracing::debug!("swapped {} and {}", a, b);
        Ok(())
    }

    /// Puts `client` in `leaf`, returning the client it held.
    pub fn set_client(&mut self, leaf: NodeId, client: ClientId) -> TileResult<ClientId> {
        match &mut self.node_mut(leaf)?.kind {
            NodeKind::Leaf { client: slot } => Ok(std::mem::replace(slot, client)),
            NodeKind::Split { .. } => Err(TileError::NotALeaf(leaf)),
        }
    }

    // ==================== Sizing ====================

    fn sizer_pair(&self, split: NodeId, index: usize) -> TileResult<(NodeId, NodeId)> {
        let children = self.children(split).ok_or(TileError::NotASplit(split))?;
        match (children.get(index), children.get(index + 1)) {
            (Some(&first), Some(&second)) => Ok((first, second)),
            _ => Err(TileError::SizerOutOfRange {
                index,
                children: children.len(),
            }),
        }
    }

    fn set_pair_ratio(&mut self, first: NodeId, second: NodeId, ratio: f64, min_ratio: f64) -> TileResult<()> {
        let total = self.node(first)?.ratio + self.node(second)?.ratio;
        if total < 2.0 * min_ratio {
            return Ok(());
        }
        let ratio = ratio.clamp(min_ratio, total - min_ratio);
        self.node_mut(first)?.ratio = ratio;
        self.node_mut(second)?.ratio = total - ratio;
        Ok(())
    }

    /// Moves `delta` of ratio from child `index + 1` to child `index`.
    pub fn resize(&mut self, split: NodeId, index: usize, delta: f64, min_ratio: f64) -> TileResult<()> {
        let (first, second) = self.sizer_pair(split, index)?;
        let ratio = self.node(first)?.ratio + delta;
        self.set_pair_ratio(first, second, ratio, min_ratio)
    }

    /// Moves the sizer after child `index` so it starts at pixel `pos`
    /// along the split direction. Uses the geometry of the last layout pass.
    pub fn drag_sizer(
        &mut self,
        split: NodeId,
        index: usize,
        pos: i32,
        sizer: i32,
        min_ratio: f64,
    ) -> TileResult<()> {
        let direction = self.direction(split).ok_or(TileError::NotASplit(split))?;
        let (first, second) = self.sizer_pair(split, index)?;
        let first_rect = self.node(first)?.rect;
        let second_rect = self.node(second)?.rect;
        let start = direction.start(first_rect);
        let end = direction.start(second_rect) + direction.length(second_rect) + sizer;
        let span = end - start;
        if span <= 0 {
            return Ok(());
        }
        let total = self.node(first)?.ratio + self.node(second)?.ratio;
        let ratio = f64::from(pos + sizer - start) / f64::from(span) * total;
        tracing::trace!("drag sizer {}[{}] to {}: ratio {}", split, index, pos, ratio);
        self.set_pair_ratio(first, second, ratio, min_ratio)
    }

    /// Product of ratios from `id` up to the root.
    pub fn effective_share(&self, id: NodeId) -> f64 {
        let mut share = 1.0;
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.get(id)) {
            share *= node.ratio;
            current = node.parent;
        }
        share
    }

    // ==================== Layout Pass ====================

    /// Computes the rectangle of every node inside `rect`.
    ///
    /// Along the split direction each child but the last gets
    /// `ratio * (length + sizer)` pixels including its trailing sizer; the
    /// last child takes what is left, so rounding never leaves a gap.
    pub fn layout(&mut self, rect: Rect, sizer: i32) {
        let root = self.root;
        if let Some(node) = self.nodes.get_mut(root.0).and_then(Option::as_mut) {
            node.sizer = None;
        }
        self.layout_node(root, rect, sizer);
    }

    fn layout_node(&mut self, id: NodeId, rect: Rect, sizer: i32) {
        let Some(node) = self.nodes.get_mut(id.0).and_then(Option::as_mut) else {
            return;
        };
        node.rect = rect;
        let NodeKind::Split { direction, children } = &node.kind else {
            return;
        };
        let direction = *direction;
        let children = children.clone();

        let full = direction.length(rect) + sizer;
        let mut remaining = full;
        let mut pos = 0;
        for (i, &child) in children.iter().enumerate() {
            let last = i + 1 == children.len();
            let ratio = self.ratio(child).unwrap_or(0.0);
            let size = if last {
                remaining
            } else {
                // ratios set from pixel positions land a hair under the pixel
                (ratio * f64::from(full) + 1e-6) as i32
            };
            let (child_rect, sizer_rect) = direction.place(rect, pos, (size - sizer).max(0), sizer);
            if let Some(node) = self.nodes.get_mut(child.0).and_then(Option::as_mut) {
                node.sizer = (!last).then_some(sizer_rect);
            }
            self.layout_node(child, child_rect, sizer);
            remaining -= size;
            pos += size;
        }
    }

    /// Leaf under a window position.
    pub fn leaf_at(&self, x: i32, y: i32) -> Option<NodeId> {
        self.leaves()
            .into_iter()
            .find(|&leaf| self.rect(leaf).is_some_and(|r| r.contains(x, y)))
    }

    /// Split and child index of the sizer under a window position.
    pub fn sizer_at(&self, x: i32, y: i32) -> Option<(NodeId, usize)> {
        self.sizer_in(self.root, x, y)
    }

    fn sizer_in(&self, split: NodeId, x: i32, y: i32) -> Option<(NodeId, usize)> {
        let children = self.children(split)?;
        for (i, &child) in children.iter().enumerate() {
            let node = self.get(child)?;
            if node.sizer.is_some_and(|r| r.contains(x, y)) {
                return Some((split, i));
            }
            if node.rect.contains(x, y) {
                return self.sizer_in(child, x, y);
            }
        }
        None
    }

    // ==================== Serialization ====================

    /// Layout of the whole tree; `leaf` supplies each leaf's chrome.
    pub fn to_layout(&self, leaf: impl Fn(ClientId) -> LeafLayout) -> SplitLayout {
        match self.node_layout(self.root, &leaf) {
            Some(LayoutNode::Split(split)) => split,
            _ => SplitLayout {
                direction: Direction::Horizontal,
                ratio_in_parent: 1.0,
                views: Vec::new(),
            },
        }
    }

    fn node_layout(&self, id: NodeId, leaf: &impl Fn(ClientId) -> LeafLayout) -> Option<LayoutNode> {
        let node = self.get(id)?;
        Some(match &node.kind {
            NodeKind::Leaf { client } => {
                let mut layout = leaf(*client);
                layout.ratio_in_parent = Some(node.ratio);
                LayoutNode::Leaf(layout)
            }
            NodeKind::Split { direction, children } => LayoutNode::Split(SplitLayout {
                direction: *direction,
                ratio_in_parent: node.ratio,
                views: children
                    .iter()
                    .filter_map(|&child| self.node_layout(child, leaf))
                    .collect(),
            }),
        })
    }

    /// Builds a tree with the shape of `layout`.
    pub fn from_layout(layout: &SplitLayout) -> TileResult<Self> {
        let mut tree = Self::empty(layout.direction);
        let root = tree.root;
        tree.node_mut(root)?.ratio = layout.ratio_in_parent;
        for view in &layout.views {
            let child = tree.build(root, view)?;
            tree.children_mut(root)?.push(child);
        }
        Ok(tree)
    }

    fn build(&mut self, parent: NodeId, layout: &LayoutNode) -> TileResult<NodeId> {
        match layout {
            LayoutNode::Leaf(leaf) => {
                let ratio = leaf
                    .ratio_in_parent
                    .ok_or_else(|| TileError::Layout("missing key 'ratio_in_parent'".to_string()))?;
                Ok(self.alloc(Node::leaf(Some(parent), ratio, leaf.child_uuid)))
            }
            LayoutNode::Split(split) => {
                if split.views.is_empty() {
                    return Err(TileError::Layout("split with no views".to_string()));
                }
                let id = self.alloc(Node::split(
                    Some(parent),
                    split.ratio_in_parent,
                    split.direction,
                    Vec::new(),
                ));
                for view in &split.views {
                    let child = self.build(id, view)?;
                    self.children_mut(id)?.push(child);
                }
                Ok(id)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_leaves() -> (SplitTree, NodeId, NodeId) {
        let mut tree = SplitTree::new(Direction::Horizontal, ClientId::new());
        let a = tree.leaves()[0];
        let b = tree.split(a, Side::Right, ClientId::new()).unwrap();
        (tree, a, b)
    }

    #[test]
    fn test_split_same_direction_inserts_sibling() {
        let (mut tree, a, b) = two_leaves();
        assert_eq!(tree.children(tree.root()).unwrap(), &[a, b]);
        assert_eq!(tree.ratio(a), Some(0.5));

        let c = tree.split(b, Side::Left, ClientId::new()).unwrap();
        assert_eq!(tree.children(tree.root()).unwrap(), &[a, c, b]);
        assert_eq!(tree.ratio(c), Some(0.25));
        assert_eq!(tree.ratio(b), Some(0.25));
    }

    #[test]
    fn test_split_opposite_wraps_leaf() {
        let (mut tree, a, b) = two_leaves();
        let c = tree.split(b, Side::Bottom, ClientId::new()).unwrap();
        let sub = tree.children(tree.root()).unwrap()[1];
        assert_eq!(tree.direction(sub), Some(Direction::Vertical));
        assert_eq!(tree.children(sub).unwrap(), &[b, c]);
        assert_eq!(tree.ratio(sub), Some(0.5));
        assert_eq!(tree.effective_share(c), 0.25);
        assert_eq!(tree.leaves(), vec![a, b, c]);
    }

    #[test]
    fn test_split_rejects_split_node() {
        let (mut tree, _, b) = two_leaves();
        tree.split(b, Side::Top, ClientId::new()).unwrap();
        let sub = tree.children(tree.root()).unwrap()[1];
        assert!(matches!(
            tree.split(sub, Side::Top, ClientId::new()),
            Err(TileError::NotALeaf(_))
        ));
    }

    #[test]
    fn test_detach_gives_ratio_to_bigger_neighbour() {
        let (mut tree, a, b) = two_leaves();
        let c = tree.split(b, Side::Right, ClientId::new()).unwrap();
        // a 0.5, b 0.25, c 0.25
        tree.detach(b).unwrap();
        assert_eq!(tree.ratio(a), Some(0.75));
        assert_eq!(tree.ratio(c), Some(0.25));
    }

    #[test]
    fn test_detach_first_gives_ratio_to_next() {
        let (mut tree, a, b) = two_leaves();
        let c = tree.split(b, Side::Right, ClientId::new()).unwrap();
        tree.detach(a).unwrap();
        assert_eq!(tree.ratio(b), Some(0.75));
        assert_eq!(tree.ratio(c), Some(0.25));
    }

    #[test]
    fn test_detach_collapses_degenerate_split() {
        let (mut tree, a, b) = two_leaves();
        let c = tree.split(b, Side::Top, ClientId::new()).unwrap();
        let sub = tree.children(tree.root()).unwrap()[1];
        let client_b = tree.client_of(b).unwrap();

        assert_eq!(tree.detach(b).unwrap(), client_b);
        assert!(tree.get(sub).is_none());
        assert_eq!(tree.children(tree.root()).unwrap(), &[a, c]);
        assert_eq!(tree.ratio(c), Some(0.5));
        assert_eq!(tree.node(c).unwrap().parent, Some(tree.root()));
    }

    #[test]
    fn test_detach_last_leaves_root_empty() {
        let (mut tree, a, b) = two_leaves();
        tree.detach(a).unwrap();
        assert_eq!(tree.ratio(b), Some(1.0));
        tree.detach(b).unwrap();
        assert!(tree.is_empty());
        let fresh = tree.reset(ClientId::new());
        assert_eq!(tree.leaves(), vec![fresh]);
    }

    #[test]
    fn test_swap_exchanges_clients() {
        let (mut tree, a, b) = two_leaves();
        let (ca, cb) = (tree.client_of(a).unwrap(), tree.client_of(b).unwrap());
        tree.swap(a, b).unwrap();
        assert_eq!(tree.client_of(a), Some(cb));
        assert_eq!(tree.client_of(b), Some(ca));
    }

    #[test]
    fn test_layout_last_child_takes_remainder() {
        let (mut tree, a, b) = two_leaves();
        tree.layout(Rect::new(0, 0, 1000, 600), 5);
        // full = 1005, first gets 502 including its sizer
        assert_eq!(tree.rect(a), Some(Rect::new(0, 0, 497, 600)));
        assert_eq!(tree.node(a).unwrap().sizer, Some(Rect::new(497, 0, 5, 600)));
        assert_eq!(tree.rect(b), Some(Rect::new(502, 0, 498, 600)));
        assert_eq!(tree.node(b).unwrap().sizer, None);
        assert_eq!(tree.leaf_at(600, 10), Some(b));
        assert_eq!(tree.sizer_at(499, 10), Some((tree.root(), 0)));
    }

    #[test]
    fn test_layout_is_idempotent() {
        let (mut tree, _, b) = two_leaves();
        tree.split(b, Side::Bottom, ClientId::new()).unwrap();
        tree.layout(Rect::new(0, 0, 640, 480), 5);
        let first: Vec<_> = tree.leaves().iter().map(|&l| tree.rect(l)).collect();
        tree.layout(Rect::new(0, 0, 640, 480), 5);
        let second: Vec<_> = tree.leaves().iter().map(|&l| tree.rect(l)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_resize_clamps() {
        let (mut tree, a, b) = two_leaves();
        let root = tree.root();
        tree.resize(root, 0, 0.2, 0.02).unwrap();
        assert!((tree.ratio(a).unwrap() - 0.7).abs() < 1e-9);
        assert!((tree.ratio(b).unwrap() - 0.3).abs() < 1e-9);

        tree.resize(root, 0, 5.0, 0.02).unwrap();
        assert!((tree.ratio(b).unwrap() - 0.02).abs() < 1e-9);
        assert!(matches!(
            tree.resize(root, 1, 0.1, 0.02),
            Err(TileError::SizerOutOfRange { index: 1, children: 2 })
        ));
    }

    #[test]
    fn test_drag_sizer_moves_to_pixel() {
        let (mut tree, a, _) = two_leaves();
        let root = tree.root();
        tree.layout(Rect::new(0, 0, 1000, 600), 5);
        tree.drag_sizer(root, 0, 197, 5, 0.02).unwrap();
        tree.layout(Rect::new(0, 0, 1000, 600), 5);
        assert_eq!(tree.node(a).unwrap().sizer.map(|r| r.x), Some(197));
    }
}
