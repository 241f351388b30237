//! Edge sidebars: strips of labels whose clients pop up on demand.
//!
//! Vertical sidebars (left, right) stack labels top to bottom; horizontal
//! ones (top, bottom) run left to right. Every sidebar takes its thickness
//! off the usable area before the split tree is laid out.

use crate::client::ClientId;
use crate::config::TileConfig;
use crate::geometry::{Rect, Side, Size};

/// One label in a sidebar.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub client: ClientId,
    /// Label rectangle from the last layout pass
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sidebar {
    side: Side,
    items: Vec<MenuItem>,
    rect: Rect,
}

impl Sidebar {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            items: Vec::new(),
            rect: Rect::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Left and right sidebars stack their labels top to bottom.
    fn stacks_vertically(&self) -> bool {
        matches!(self.side, Side::Left | Side::Right)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn position(&self, client: ClientId) -> Option<usize> {
        self.items.iter().position(|item| item.client == client)
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.position(client).is_some()
    }

    pub fn clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.items.iter().map(|item| item.client)
    }

    pub fn push(&mut self, client: ClientId) {
        self.insert(self.items.len(), client);
    }

    pub fn insert(&mut self, index: usize, client: ClientId) {
        let index = index.min(self.items.len());
        self.items.insert(
            index,
            MenuItem {
                client,
                rect: Rect::default(),
            },
        );
    }

    pub fn remove(&mut self, client: ClientId) -> Option<usize> {
        let index = self.position(client)?;
        self.items.remove(index);
        Some(index)
    }

    pub(crate) fn replace(&mut self, old: ClientId, new: ClientId) -> bool {
        match self.items.iter_mut().find(|item| item.client == old) {
            Some(item) => {
                item.client = new;
                true
            }
            None => false,
        }
    }

    /// Claims a strip of `area` for this sidebar and returns what is left.
    pub fn set_size_inside(&mut self, area: Rect, config: &TileConfig) -> Rect {
        let t = config.sidebar_thickness();
        let (strip, rest) = match self.side {
            Side::Left => (
                Rect::new(area.x, area.y, t, area.height),
                Rect::new(area.x + t, area.y, area.width - t, area.height),
            ),
            Side::Right => (
                Rect::new(area.right() - t, area.y, t, area.height),
                Rect::new(area.x, area.y, area.width - t, area.height),
            ),
            Side::Top => (
                Rect::new(area.x, area.y, area.width, t),
                Rect::new(area.x, area.y + t, area.width, area.height - t),
            ),
            Side::Bottom => (
                Rect::new(area.x, area.bottom() - t, area.width, t),
                Rect::new(area.x, area.y, area.width, area.height - t),
            ),
        };
        self.rect = strip;
        rest
    }

    /// Lays out the labels along the strip. `text_width` measures a
    /// client's label text.
    pub fn layout_items(&mut self, config: &TileConfig, text_width: impl Fn(ClientId) -> i32) {
        let strip = self.rect;
        let vertical = self.stacks_vertically();
        let mut pos = 0;
        for item in &mut self.items {
            let size = text_width(item.client) + 2 * config.sidebar_margin;
            item.rect = if vertical {
                Rect::new(strip.x, strip.y + pos, strip.width, size)
            } else {
                Rect::new(strip.x + pos, strip.y, size, strip.height)
            };
            pos += size;
        }
    }

    pub fn item_at(&self, x: i32, y: i32) -> Option<ClientId> {
        self.items
            .iter()
            .find(|item| item.rect.contains(x, y))
            .map(|item| item.client)
    }

    /// Top left corner a popup for the item at `index` wants, before
    /// clamping. Popups open beside the strip, next to their label.
    pub fn popup_anchor(&self, index: usize) -> Option<(i32, i32)> {
        let label = self.items.get(index)?.rect;
        let strip = self.rect;
        Some(match self.side {
            Side::Left => (strip.right(), label.y),
            Side::Right => (strip.x, label.y),
            Side::Top => (label.x, strip.bottom()),
            Side::Bottom => (label.x, strip.y),
        })
    }

    /// Drop strips for the item at `index`: one straddling the gap after
    /// it, plus one at the leading edge for the first item. Each is a third
    /// of the label long.
    pub fn dock_rectangles(&self, index: usize) -> Vec<(Side, Rect)> {
        let Some(item) = self.items.get(index) else {
            return Vec::new();
        };
        let r = item.rect;
        let mut rects = Vec::new();
        if self.stacks_vertically() {
            let h = r.height / 3;
            if index == 0 {
                rects.push((Side::Top, Rect::new(r.x, r.y, r.width, h)));
            }
            let ty = r.bottom() - h / 2;
            rects.push((Side::Bottom, Rect::new(r.x, ty, r.width, h)));
        } else {
            let w = r.width / 3;
            if index == 0 {
                rects.push((Side::Left, Rect::new(r.x, r.y, w, r.height)));
            }
            let rx = r.right() - w / 2;
            rects.push((Side::Right, Rect::new(rx, r.y, w, r.height)));
        }
        rects
    }
}

/// Strip along `side` of the window where dropping creates that sidebar.
pub fn missing_sidebar_rect(side: Side, window: Rect, usable: Rect, config: &TileConfig) -> Rect {
    let t = config.sidebar_thickness() / 2;
    match side {
        Side::Left => Rect::new(window.x, usable.y, t, usable.height),
        Side::Right => Rect::new(window.right() - t, usable.y, t, usable.height),
        Side::Top => Rect::new(usable.x, window.y, usable.width, t),
        Side::Bottom => Rect::new(usable.x, window.bottom() - t, usable.width, t),
    }
}

/// Fits a popup of `size` anchored at `(x, y)` into `usable`.
///
/// A popup running past the right or bottom edge slides back; one larger
/// than the usable area is pinned to its origin and shrunk to fit.
pub fn clamp_popup(x: i32, y: i32, size: Size, usable: Rect) -> Rect {
    let (mut x, mut y) = (x, y);
    let (mut w, mut h) = (size.width, size.height);
    if y + h > usable.bottom() {
        y -= y + h - usable.bottom();
    }
    if y < usable.y {
        y = usable.y;
        h = usable.height;
    }
    if w > usable.width {
        w = usable.width;
    }
    if x + w > usable.right() {
        x -= x + w - usable.right();
    }
    if x < usable.x {
        x = usable.x;
        w = usable.width;
    }
    Rect::new(x, y, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sidebar_with(side: Side, count: usize) -> (Sidebar, Vec<ClientId>) {
        let mut sidebar = Sidebar::new(side);
        let ids: Vec<ClientId> = (0..count).map(|_| ClientId::new()).collect();
        for &id in &ids {
            sidebar.push(id);
        }
        (sidebar, ids)
    }

    #[test]
    fn test_set_size_inside_each_side() {
        let config = TileConfig::default();
        let area = Rect::new(0, 0, 800, 600);
        let mut left = Sidebar::new(Side::Left);
        assert_eq!(left.set_size_inside(area, &config), Rect::new(22, 0, 778, 600));
        assert_eq!(left.rect(), Rect::new(0, 0, 22, 600));

        let mut bottom = Sidebar::new(Side::Bottom);
        assert_eq!(bottom.set_size_inside(area, &config), Rect::new(0, 0, 800, 578));
        assert_eq!(bottom.rect(), Rect::new(0, 578, 800, 22));
    }

    #[test]
    fn test_labels_are_text_width_plus_margins() {
        let config = TileConfig::default();
        let (mut sidebar, ids) = sidebar_with(Side::Left, 2);
        sidebar.set_size_inside(Rect::new(0, 0, 800, 600), &config);
        sidebar.layout_items(&config, |_| 40);
        assert_eq!(sidebar.items()[0].rect, Rect::new(0, 0, 22, 48));
        assert_eq!(sidebar.items()[1].rect, Rect::new(0, 48, 22, 48));
        assert_eq!(sidebar.item_at(5, 50), Some(ids[1]));
        assert_eq!(sidebar.popup_anchor(1), Some((22, 48)));
    }

    #[test]
    fn test_dock_rectangles_in_thirds() {
        let config = TileConfig::default();
        let (mut sidebar, _) = sidebar_with(Side::Left, 2);
        sidebar.set_size_inside(Rect::new(0, 0, 800, 600), &config);
        sidebar.layout_items(&config, |_| 52);
        // labels are 60 high
        let first = sidebar.dock_rectangles(0);
        assert_eq!(first[0], (Side::Top, Rect::new(0, 0, 22, 20)));
        assert_eq!(first[1], (Side::Bottom, Rect::new(0, 50, 22, 20)));
        assert_eq!(sidebar.dock_rectangles(1).len(), 1);
    }

    #[test]
    fn test_insert_and_remove() {
        let (mut sidebar, ids) = sidebar_with(Side::Top, 2);
        let extra = ClientId::new();
        sidebar.insert(1, extra);
        assert_eq!(sidebar.clients().collect::<Vec<_>>(), vec![ids[0], extra, ids[1]]);
        assert_eq!(sidebar.remove(ids[0]), Some(0));
        assert_eq!(sidebar.remove(ids[0]), None);
        assert_eq!(sidebar.len(), 2);
    }

    #[test]
    fn test_missing_sidebar_strips_are_half_thickness() {
        let config = TileConfig::default();
        let window = Rect::new(0, 0, 800, 600);
        let usable = Rect::new(22, 0, 778, 600);
        assert_eq!(
            missing_sidebar_rect(Side::Right, window, usable, &config),
            Rect::new(789, 0, 11, 600)
        );
        assert_eq!(
            missing_sidebar_rect(Side::Top, window, usable, &config),
            Rect::new(22, 0, 778, 11)
        );
    }

    #[test]
    fn test_clamp_popup() {
        let usable = Rect::new(22, 0, 778, 600);
        // fits
        assert_eq!(clamp_popup(22, 100, Size::new(200, 150), usable), Rect::new(22, 100, 200, 150));
        // runs off the bottom
        assert_eq!(clamp_popup(22, 500, Size::new(200, 150), usable), Rect::new(22, 450, 200, 150));
        // taller than the usable area
        assert_eq!(clamp_popup(22, 10, Size::new(200, 900), usable), Rect::new(22, 0, 200, 600));
        // wider than the usable area
        assert_eq!(clamp_popup(22, 10, Size::new(1000, 100), usable), Rect::new(22, 10, 778, 100));
        // anchored at the right edge
        assert_eq!(clamp_popup(800, 10, Size::new(200, 100), usable), Rect::new(600, 10, 200, 100));
    }
}
