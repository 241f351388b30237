//! The seam between the tile manager and a real widget toolkit.
//!
//! The manager only decides geometry and parentage. Whatever owns the
//! widgets implements [`HostAdapter`] and mirrors those decisions.

use std::collections::{HashMap, HashSet};

use crate::geometry::{Rect, Size};
use crate::tree::NodeId;

/// Where a widget currently belongs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parent {
    /// Displayed in a leaf of the split tree
    Leaf(NodeId),
    /// Owned by a sidebar, shown only while its popup is open
    Popup,
    /// Detached but kept alive across structural edits
    HidingSpace,
}

/// Operations the manager needs from the widget toolkit.
pub trait HostAdapter {
    /// Handle to a user widget.
    type Widget;

    fn show(&mut self, widget: &Self::Widget);

    fn hide(&mut self, widget: &Self::Widget);

    fn reparent(&mut self, widget: &Self::Widget, parent: Parent);

    fn set_bounds(&mut self, widget: &Self::Widget, rect: Rect);

    fn best_size(&self, widget: &Self::Widget) -> Size;

    fn set_focus(&mut self, widget: &Self::Widget);

    /// Pixel width of `text` in the label font.
    fn text_width(&self, text: &str) -> i32;

    /// Called once when a client is closed for good.
    fn destroy(&mut self, widget: Self::Widget) {
        drop(widget);
    }
}

/// A host without a screen: widgets are names and every call is recorded.
///
/// Used by the command-line layout tool and by tests.
#[derive(Debug)]
pub struct HeadlessHost {
    pub bounds: HashMap<String, Rect>,
    pub visible: HashSet<String>,
    pub parents: HashMap<String, Parent>,
    pub focused: Option<String>,
    pub destroyed: Vec<String>,
    /// Width of one label character
    pub char_width: i32,
    /// Size reported for every widget
    pub best: Size,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self {
            bounds: HashMap::new(),
            visible: HashSet::new(),
            parents: HashMap::new(),
            focused: None,
            destroyed: Vec::new(),
            char_width: 7,
            best: Size::new(200, 150),
        }
    }
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self, widget: &str) -> bool {
        self.visible.contains(widget)
    }
}

impl HostAdapter for HeadlessHost {
    type Widget = String;

    fn show(&mut self, widget: &String) {
        self.visible.insert(widget.clone());
    }

    fn hide(&mut self, widget: &String) {
        self.visible.remove(widget);
    }

    fn reparent(&mut self, widget: &String, parent: Parent) {
        self.parents.insert(widget.clone(), parent);
    }

    fn set_bounds(&mut self, widget: &String, rect: Rect) {
        self.bounds.insert(widget.clone(), rect);
    }

    fn best_size(&self, _widget: &String) -> Size {
        self.best
    }

    fn set_focus(&mut self, widget: &String) {
        self.focused = Some(widget.clone());
    }

    fn text_width(&self, text: &str) -> i32 {
        self.char_width * text.chars().count() as i32
    }

    fn destroy(&mut self, widget: String) {
        self.visible.remove(&widget);
        self.bounds.remove(&widget);
        self.parents.remove(&widget);
        if self.focused.as_deref() == Some(widget.as_str()) {
            self.focused = None;
        }
        self.destroyed.push(widget);
    }
}
