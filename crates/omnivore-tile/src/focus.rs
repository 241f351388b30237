//! Focus tracking and sidebar popups.
//!
//! Focus is either a leaf of the main tree or a sidebar item whose popup is
//! open. The manager remembers the last focused leaf so that closing a
//! popup can hand focus back to where the user came from.
//!
//! Popups follow a small state machine:
//!
//! ```text
//!   closed --click label--> open (popdown mode)
//!   open   --hover other label--> open on the other item
//!   open   --click inside popup--> open (focused, popdown off)
//!   open   --escape / click elsewhere / focus lost--> closed
//! ```

use crate::client::{Client, ClientId};
use crate::geometry::{Rect, Size};
use crate::host::{HostAdapter, Parent};
use crate::manager::TileManager;
use crate::sidebar::clamp_popup;
use crate::tree::NodeId;
use crate::{TileError, TileResult};

/// Size used for a popup whose client has no widget.
const PLACEHOLDER_POPUP: Size = Size::new(200, 200);

/// What currently holds focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Leaf(NodeId),
    /// A sidebar item, while its popup is open
    Menu(ClientId),
}

#[derive(Debug, Default)]
pub(crate) struct FocusState {
    pub current: Option<Focus>,
    pub previous_leaf: Option<NodeId>,
}

#[derive(Debug, Default)]
pub(crate) struct PopupState {
    pub displayed: Option<ClientId>,
    pub rect: Option<Rect>,
    /// Hovering another label switches the popup without a click
    pub popdown_mode: bool,
}

impl<H: HostAdapter> TileManager<H> {
    pub fn current_focus(&self) -> Option<Focus> {
        self.focus.current
    }

    /// Last leaf that held focus, if it still exists.
    pub fn previous_leaf_focus(&self) -> Option<NodeId> {
        self.focus.previous_leaf.filter(|&leaf| self.tree.is_leaf(leaf))
    }

    pub fn displayed_popup(&self) -> Option<ClientId> {
        self.popup.displayed
    }

    pub fn popup_rect(&self) -> Option<Rect> {
        self.popup.rect
    }

    pub fn is_popdown_mode(&self) -> bool {
        self.popup.popdown_mode
    }

    /// Moves focus to `target`, or to the first leaf when `target` is
    /// `None` or no longer exists. Any popup other than the target's is
    /// closed.
    pub fn set_leaf_focus(&mut self, target: Option<Focus>) {
        let last = self.focus.current;
        let target = target
            .filter(|&t| self.focus_is_valid(t))
            .or_else(|| self.tree.leaves().first().map(|&leaf| Focus::Leaf(leaf)));
        self.focus.current = target;

        if let Some(open) = self.popup.displayed {
            if target != Some(Focus::Menu(open)) {
                self.close_popup();
            }
        }
        let Some(target) = target else {
            return;
        };
        if Some(target) != last {
            tracing::debug!("focus: {:?} -> {:?}", last, target);
            if let Some(client) = self.focus_client(target) {
                if let Some(widget) = self.clients.get(&client).and_then(Client::widget) {
                    self.host.set_focus(widget);
                }
                self.events.push(crate::TileEvent::ClientActivated(client));
            }
        }
        if let Focus::Leaf(leaf) = target {
            self.focus.previous_leaf = Some(leaf);
        }
    }

    /// Focuses whichever leaf or sidebar item shows `client`.
    pub fn force_focus(&mut self, client: ClientId) -> TileResult<()> {
        if let Some(leaf) = self.tree.find_client(client) {
            self.set_leaf_focus(Some(Focus::Leaf(leaf)));
            return Ok(());
        }
        if self.sidebars.iter().any(|s| s.contains(client)) {
            self.open_popup(client)?;
            self.set_leaf_focus(Some(Focus::Menu(client)));
            return Ok(());
        }
        Err(TileError::ClientNotFound(client))
    }

    /// Gives focus back to the last focused leaf, or the first one.
    pub fn restore_last_main_focus(&mut self) {
        let target = self.previous_leaf_focus().map(Focus::Leaf);
        self.set_leaf_focus(target);
    }

    /// Closes any open popup and returns focus to the main area.
    pub fn force_clear_sidebar(&mut self) {
        self.popup.popdown_mode = false;
        if self.popup.displayed.is_some() {
            self.close_popup();
            self.restore_last_main_focus();
        }
    }

    /// Shows the popup for a sidebar item. Opening clears its
    /// notification count.
    pub fn open_popup(&mut self, client: ClientId) -> TileResult<()> {
        if !self.sidebars.iter().any(|s| s.contains(client)) {
            return Err(TileError::ClientNotFound(client));
        }
        if self.popup.displayed == Some(client) {
            return Ok(());
        }
        self.close_popup();
        self.popup.displayed = Some(client);
        if let Some(c) = self.clients.get_mut(&client) {
            c.set_notification_count(0);
        }
        tracing::debug!("popup: open {}", client);
        self.place_popup(client);
        Ok(())
    }

    /// Opens the popup for `client`, or closes it if it is already open.
    pub fn toggle_popup(&mut self, client: ClientId) -> TileResult<()> {
        if self.popup.displayed == Some(client) {
            self.force_clear_sidebar();
            return Ok(());
        }
        self.open_popup(client)?;
        self.popup.popdown_mode = true;
        Ok(())
    }

    /// Sidebar label under the point, if any.
    pub fn menu_item_at(&self, x: i32, y: i32) -> Option<ClientId> {
        self.sidebars.iter().find_map(|s| s.item_at(x, y))
    }

    /// Pointer motion. In popdown mode, crossing a label switches the
    /// popup to it.
    pub fn hover(&mut self, x: i32, y: i32) -> Option<ClientId> {
        let item = self.menu_item_at(x, y)?;
        if self.popup.popdown_mode && self.popup.displayed != Some(item) {
            if let Err(err) = self.open_popup(item) {
                tracing::warn!("hover: {}", err);
                return None;
            }
            self.popup.popdown_mode = true;
        }
        Some(item)
    }

    /// Primary button press.
    pub fn click(&mut self, x: i32, y: i32) {
        if let Some(item) = self.menu_item_at(x, y) {
            if let Err(err) = self.toggle_popup(item) {
                tracing::warn!("click: {}", err);
            }
            return;
        }
        if let (Some(open), Some(rect)) = (self.popup.displayed, self.popup.rect) {
            if rect.contains(x, y) {
                self.popup.popdown_mode = false;
                self.set_leaf_focus(Some(Focus::Menu(open)));
                return;
            }
        }
        match self.tree.leaf_at(x, y) {
            Some(leaf) => self.set_leaf_focus(Some(Focus::Leaf(leaf))),
            None => self.force_clear_sidebar(),
        }
    }

    /// Escape key. Returns whether a popup was dismissed.
    pub fn key_escape(&mut self) -> bool {
        if self.popup.displayed.is_none() {
            return false;
        }
        self.force_clear_sidebar();
        true
    }

    /// The application lost activation to another program.
    pub fn app_deactivated(&mut self) {
        self.force_clear_sidebar();
    }

    /// Keyboard focus left the managed widgets.
    pub fn focus_lost(&mut self) {
        self.force_clear_sidebar();
    }

    /// Sizes and positions the open popup beside its label.
    pub(crate) fn place_popup(&mut self, client: ClientId) {
        let Some((sidebar, index)) = self
            .sidebars
            .iter()
            .find_map(|s| s.position(client).map(|index| (s, index)))
        else {
            return;
        };
        let Some((x, y)) = sidebar.popup_anchor(index) else {
            return;
        };
        let Some(c) = self.clients.get(&client) else {
            return;
        };
        let best = c
            .widget()
            .map(|w| self.host.best_size(w))
            .unwrap_or(PLACEHOLDER_POPUP);
        let title = if c.show_title {
            self.config.title_bar_height
        } else {
            0
        };
        let rect = clamp_popup(x, y, Size::new(best.width, best.height + title), self.usable);
        self.popup.rect = Some(rect);
        let content = self.below_title(rect, c.show_title);
        if let Some(widget) = c.widget() {
            self.host.reparent(widget, Parent::Popup);
            self.host.set_bounds(widget, content);
            self.host.show(widget);
        }
    }

    fn close_popup(&mut self) {
        let Some(open) = self.popup.displayed.take() else {
            return;
        };
        self.popup.rect = None;
        if self.focus.current == Some(Focus::Menu(open)) {
            self.focus.current = None;
        }
        if let Some(widget) = self.clients.get(&open).and_then(Client::widget) {
            self.host.hide(widget);
        }
        tracing::debug!("popup: closed {}", open);
    }

    fn focus_is_valid(&self, focus: Focus) -> bool {
        match focus {
            Focus::Leaf(leaf) => self.tree.is_leaf(leaf),
            Focus::Menu(client) => self.sidebars.iter().any(|s| s.contains(client)),
        }
    }

    fn focus_client(&self, focus: Focus) -> Option<ClientId> {
        match focus {
            Focus::Leaf(leaf) => self.tree.client_of(leaf),
            Focus::Menu(client) => Some(client),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::client::ClientOptions;
    use crate::config::TileConfig;
    use crate::geometry::{Rect, Side};
    use crate::host::HeadlessHost;
    use crate::manager::{TileEvent, TileManager};

    use super::*;

    struct Fixture {
        tm: TileManager<HeadlessHost>,
        main: ClientId,
        log: ClientId,
        notes: ClientId,
    }

    fn fixture() -> Fixture {
        let mut tm = TileManager::new(HeadlessHost::new(), TileConfig::default());
        tm.set_window(Rect::new(0, 0, 800, 600));
        let main = tm.add("main".into(), None, ClientOptions::titled("main"));
        let log = tm.add_to_sidebar("log".into(), None, Side::Left, ClientOptions::titled("log"));
        let notes = tm.add_to_sidebar("notes".into(), None, Side::Left, ClientOptions::titled("notes"));
        tm.drain_events();
        Fixture { tm, main, log, notes }
    }

    #[test]
    fn test_null_focus_picks_first_leaf() {
        let Fixture { mut tm, main, .. } = fixture();
        tm.set_leaf_focus(None);
        let leaf = tm.tree().find_client(main).unwrap();
        assert_eq!(tm.current_focus(), Some(Focus::Leaf(leaf)));
        assert_eq!(tm.host().focused.as_deref(), Some("main"));
        assert_eq!(tm.drain_events(), vec![TileEvent::ClientActivated(main)]);
    }

    #[test]
    fn test_click_label_opens_popup_beside_it() {
        let Fixture { mut tm, log, .. } = fixture();
        // "log" label: 3 * 7 + 8 = 29 high at the top of the left strip
        tm.click(5, 10);
        assert_eq!(tm.displayed_popup(), Some(log));
        assert!(tm.is_popdown_mode());
        assert!(tm.host().is_visible("log"));
        // best size 200x150 plus a 20 pixel title bar
        assert_eq!(tm.popup_rect(), Some(Rect::new(22, 0, 200, 170)));
        assert_eq!(tm.host().bounds["log"], Rect::new(22, 20, 200, 150));

        tm.click(5, 10);
        assert_eq!(tm.displayed_popup(), None);
        assert!(!tm.host().is_visible("log"));
    }

    #[test]
    fn test_hover_switches_popup_in_popdown_mode() {
        let Fixture { mut tm, log, notes, .. } = fixture();
        assert_eq!(tm.hover(5, 10), Some(log));
        assert_eq!(tm.displayed_popup(), None);

        tm.click(5, 10);
        // "notes" label starts below "log"
        assert_eq!(tm.hover(5, 35), Some(notes));
        assert_eq!(tm.displayed_popup(), Some(notes));
        assert!(!tm.host().is_visible("log"));
        assert!(tm.host().is_visible("notes"));
    }

    #[test]
    fn test_click_inside_popup_focuses_it() {
        let Fixture { mut tm, log, .. } = fixture();
        tm.click(5, 10);
        tm.click(100, 100);
        assert_eq!(tm.current_focus(), Some(Focus::Menu(log)));
        assert!(!tm.is_popdown_mode());
        assert_eq!(tm.host().focused.as_deref(), Some("log"));
    }

    #[test]
    fn test_click_main_area_closes_popup_and_focuses_leaf() {
        let Fixture { mut tm, main, .. } = fixture();
        tm.click(5, 10);
        tm.click(500, 300);
        assert_eq!(tm.displayed_popup(), None);
        let leaf = tm.tree().find_client(main).unwrap();
        assert_eq!(tm.current_focus(), Some(Focus::Leaf(leaf)));
    }

    #[test]
    fn test_escape_restores_previous_leaf() {
        let Fixture { mut tm, main, log, .. } = fixture();
        let leaf = tm.tree().find_client(main).unwrap();
        tm.set_leaf_focus(Some(Focus::Leaf(leaf)));
        tm.force_focus(log).unwrap();
        assert_eq!(tm.current_focus(), Some(Focus::Menu(log)));

        assert!(tm.key_escape());
        assert_eq!(tm.current_focus(), Some(Focus::Leaf(leaf)));
        assert!(!tm.key_escape());
    }

    #[test]
    fn test_focus_lost_and_deactivation_close_popup() {
        let Fixture { mut tm, .. } = fixture();
        tm.click(5, 10);
        tm.focus_lost();
        assert_eq!(tm.displayed_popup(), None);

        tm.click(5, 10);
        tm.app_deactivated();
        assert_eq!(tm.displayed_popup(), None);
        assert!(!tm.is_popdown_mode());
    }

    #[test]
    fn test_opening_popup_clears_notifications() {
        let Fixture { mut tm, log, .. } = fixture();
        tm.notify(log, 4).unwrap();
        assert_eq!(tm.client(log).unwrap().notification_count(), 4);
        tm.open_popup(log).unwrap();
        assert_eq!(tm.client(log).unwrap().notification_count(), 0);
    }

    #[test]
    fn test_open_popup_rejects_leaf_client() {
        let Fixture { mut tm, main, .. } = fixture();
        assert!(tm.open_popup(main).is_err());
    }
}
