//! The tile manager.
//!
//! Owns the split tree, the sidebars and every client. Widgets themselves
//! stay with the host; the manager tells the [`HostAdapter`] where each one
//! belongs and how big it is after every change.
//!
//! Structural edits are split across a few files, all as `impl` blocks on
//! [`TileManager`]:
//!
//! - this file: clients, splitting, detaching, sizing, sidebars
//! - `focus.rs`: focus tracking and sidebar popups
//! - `dock.rs`: drag-to-dock
//! - `layout.rs`: JSON layout save and restore

use std::collections::HashMap;

use crate::client::{Client, ClientId, ClientOptions};
use crate::config::TileConfig;
use crate::dock::DragState;
use crate::focus::{Focus, FocusState, PopupState};
use crate::geometry::{Direction, Rect, Side};
use crate::host::{HostAdapter, Parent};
use crate::sidebar::Sidebar;
use crate::tree::{NodeId, SplitTree};
use crate::{TileError, TileResult};

/// Where a placed client lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Leaf(NodeId),
    Sidebar { side: Side, index: usize },
}

/// Notifications for the host, collected until [`TileManager::drain_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileEvent {
    ClientClosed(ClientId),
    ClientReplaced(ClientId),
    ClientActivated(ClientId),
    LayoutChanged,
}

pub struct TileManager<H: HostAdapter> {
    pub(crate) config: TileConfig,
    pub(crate) host: H,
    pub(crate) tree: SplitTree,
    pub(crate) sidebars: Vec<Sidebar>,
    pub(crate) clients: HashMap<ClientId, Client<H::Widget>>,
    pub(crate) window: Rect,
    pub(crate) usable: Rect,
    pub(crate) focus: FocusState,
    pub(crate) popup: PopupState,
    pub(crate) drag: Option<DragState>,
    pub(crate) events: Vec<TileEvent>,
}

impl<H: HostAdapter> TileManager<H> {
    /// A manager with a horizontal root holding one empty leaf.
    pub fn new(host: H, config: TileConfig) -> Self {
        Self::with_direction(host, config, Direction::Horizontal)
    }

    pub fn with_direction(host: H, config: TileConfig, direction: Direction) -> Self {
        let placeholder = ClientId::new();
        let mut clients = HashMap::new();
        clients.insert(placeholder, Client::placeholder(placeholder));
        Self {
            config,
            host,
            tree: SplitTree::new(direction, placeholder),
            sidebars: Vec::new(),
            clients,
            window: Rect::default(),
            usable: Rect::default(),
            focus: FocusState::default(),
            popup: PopupState::default(),
            drag: None,
            events: Vec::new(),
        }
    }

    // ==================== Accessors ====================

    pub fn config(&self) -> &TileConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn tree(&self) -> &SplitTree {
        &self.tree
    }

    pub fn sidebars(&self) -> &[Sidebar] {
        &self.sidebars
    }

    pub fn sidebar(&self, side: Side) -> Option<&Sidebar> {
        self.sidebars.iter().find(|s| s.side() == side)
    }

    pub fn client(&self, id: ClientId) -> Option<&Client<H::Widget>> {
        self.clients.get(&id)
    }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client<H::Widget>> {
        self.clients.get_mut(&id)
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn window(&self) -> Rect {
        self.window
    }

    /// Area left for the split tree once sidebars are placed.
    pub fn usable_rect(&self) -> Rect {
        self.usable
    }

    /// Takes the events gathered since the last call.
    pub fn drain_events(&mut self) -> Vec<TileEvent> {
        std::mem::take(&mut self.events)
    }

    // ==================== Lookup ====================

    pub fn locate(&self, id: ClientId) -> Option<Location> {
        if let Some(leaf) = self.tree.find_client(id) {
            return Some(Location::Leaf(leaf));
        }
        self.sidebars.iter().find_map(|sidebar| {
            sidebar.position(id).map(|index| Location::Sidebar {
                side: sidebar.side(),
                index,
            })
        })
    }

    /// Where the client with `id` is shown, searching the tree first.
    pub fn find_uuid(&self, id: ClientId) -> Option<Location> {
        self.locate(id)
    }

    /// First placeholder, in tree order and then sidebar order.
    pub fn find_empty(&self) -> Option<Location> {
        let is_empty = |id: ClientId| self.clients.get(&id).is_some_and(Client::is_empty);
        if let Some(leaf) = self
            .tree
            .leaves()
            .into_iter()
            .find(|&leaf| self.tree.client_of(leaf).is_some_and(is_empty))
        {
            return Some(Location::Leaf(leaf));
        }
        self.sidebars.iter().find_map(|sidebar| {
            sidebar
                .clients()
                .position(is_empty)
                .map(|index| Location::Sidebar {
                    side: sidebar.side(),
                    index,
                })
        })
    }

    /// Leaves of the main tree with their clients, in tree order.
    pub fn iter_leaves(&self) -> impl Iterator<Item = (NodeId, &Client<H::Widget>)> + '_ {
        self.tree.leaves().into_iter().filter_map(move |leaf| {
            let id = self.tree.client_of(leaf)?;
            Some((leaf, self.clients.get(&id)?))
        })
    }

    fn client_at(&self, location: Location) -> Option<ClientId> {
        match location {
            Location::Leaf(leaf) => self.tree.client_of(leaf),
            Location::Sidebar { side, index } => {
                self.sidebar(side)?.items().get(index).map(|item| item.client)
            }
        }
    }

    // ==================== Geometry ====================

    /// Sets the window rectangle and lays everything out.
    pub fn set_window(&mut self, rect: Rect) {
        self.window = rect;
        self.do_layout();
    }

    /// Places sidebars, then the split tree in what remains, then pushes
    /// every visible widget's bounds to the host.
    pub fn do_layout(&mut self) {
        let mut area = self.window;
        for sidebar in &mut self.sidebars {
            area = sidebar.set_size_inside(area, &self.config);
        }
        let clients = &self.clients;
        let host = &self.host;
        for sidebar in &mut self.sidebars {
            sidebar.layout_items(&self.config, |id| {
                let name = clients.get(&id).map(Client::popup_name).unwrap_or_default();
                host.text_width(&name)
            });
        }
        self.usable = area;
        self.tree.layout(area, self.config.sizer_thickness);

        for leaf in self.tree.leaves() {
            let Some(rect) = self.content_rect(leaf) else {
                continue;
            };
            let widget = self
                .tree
                .client_of(leaf)
                .and_then(|id| self.clients.get(&id))
                .and_then(Client::widget);
            if let Some(widget) = widget {
                self.host.set_bounds(widget, rect);
            }
        }
        if let Some(open) = self.popup.displayed {
            self.place_popup(open);
        }
        tracing::trace!("layout: window {} usable {}", self.window, self.usable);
    }

    /// Title bar of a leaf, if its client shows one.
    pub fn title_bar_rect(&self, leaf: NodeId) -> Option<Rect> {
        let rect = self.tree.rect(leaf)?;
        let client = self.clients.get(&self.tree.client_of(leaf)?)?;
        client
            .show_title
            .then(|| Rect::new(rect.x, rect.y, rect.width, self.config.title_bar_height))
    }

    /// Area of a leaf given to its widget.
    pub fn content_rect(&self, leaf: NodeId) -> Option<Rect> {
        let rect = self.tree.rect(leaf)?;
        let client = self.clients.get(&self.tree.client_of(leaf)?)?;
        Some(self.below_title(rect, client.show_title))
    }

    pub(crate) fn below_title(&self, rect: Rect, show_title: bool) -> Rect {
        if show_title {
            let offset = self.config.title_bar_height.min(rect.height);
            Rect::new(rect.x, rect.y + offset, rect.width, rect.height - offset)
        } else {
            rect
        }
    }

    // ==================== Clients ====================

    /// Registers a widget without placing it. It waits in the hiding space
    /// until split into the tree or added to a sidebar.
    pub fn insert_client(&mut self, widget: H::Widget, options: ClientOptions) -> ClientId {
        let id = ClientId::new();
        self.insert_client_with_id(id, widget, options);
        id
    }

    fn insert_client_with_id(&mut self, id: ClientId, widget: H::Widget, options: ClientOptions) {
        self.clients.insert(id, Client::new(id, widget, options));
        self.sync_widget(id);
    }

    pub(crate) fn insert_placeholder(&mut self, id: ClientId) {
        self.clients.insert(id, Client::placeholder(id));
    }

    fn replace_widget(&mut self, id: ClientId, widget: H::Widget, options: ClientOptions) {
        let Some(client) = self.clients.get_mut(&id) else {
            return;
        };
        if let Some(old) = client.replace_widget(widget, options) {
            self.host.destroy(old);
            self.events.push(TileEvent::ClientReplaced(id));
        }
        self.sync_widget(id);
    }

    /// Shows `widget` somewhere sensible.
    ///
    /// A client already using `id` gets the new widget in place. Otherwise
    /// the first empty placeholder is filled, and failing that the focused
    /// leaf is split to the right.
    pub fn add(&mut self, widget: H::Widget, id: Option<ClientId>, options: ClientOptions) -> ClientId {
        let id = id.unwrap_or_default();
        if self.clients.contains_key(&id) {
            self.replace_widget(id, widget, options);
            if self.locate(id).is_some() {
                tracing::debug!("add: replaced widget of {}", id);
                self.do_layout();
                return id;
            }
        } else {
            self.insert_client_with_id(id, widget, options);
        }

        if let Some(location) = self.find_empty() {
            self.fill_placeholder(location, id);
        } else {
            let target = self
                .focused_leaf()
                .or_else(|| self.tree.leaves().last().copied());
            match target {
                Some(leaf) => {
                    if let Err(err) = self.tree.split(leaf, Side::Right, id) {
                        tracing::warn!("add: could not split {}: {}", leaf, err);
                    }
                }
                None => {
                    self.tree.reset(id);
                }
            }
        }
        tracing::debug!("add: placed {}", id);
        self.sync_widget(id);
        self.layout_changed();
        id
    }

    /// Adds `widget` as a new item of the sidebar on `side`.
    pub fn add_to_sidebar(
        &mut self,
        widget: H::Widget,
        id: Option<ClientId>,
        side: Side,
        options: ClientOptions,
    ) -> ClientId {
        let id = id.unwrap_or_default();
        if self.clients.contains_key(&id) {
            self.replace_widget(id, widget, options);
            if self.locate(id).is_some() {
                self.do_layout();
                return id;
            }
        } else {
            self.insert_client_with_id(id, widget, options);
        }
        let index = self.use_sidebar(side);
        self.sidebars[index].push(id);
        self.sync_widget(id);
        self.layout_changed();
        id
    }

    fn fill_placeholder(&mut self, location: Location, id: ClientId) {
        let old = match location {
            Location::Leaf(leaf) => self.tree.set_client(leaf, id).ok(),
            Location::Sidebar { side, index } => {
                let old = self.client_at(Location::Sidebar { side, index });
                if let (Some(old), Some(sidebar)) =
                    (old, self.sidebars.iter_mut().find(|s| s.side() == side))
                {
                    sidebar.replace(old, id);
                }
                old
            }
        };
        if let Some(old) = old {
            self.clients.remove(&old);
        }
    }

    /// Splits `leaf`, putting the unplaced client `client` on `side`.
    pub fn split(&mut self, leaf: NodeId, side: Side, client: ClientId) -> TileResult<NodeId> {
        if !self.clients.contains_key(&client) {
            return Err(TileError::ClientNotFound(client));
        }
        if self.locate(client).is_some() {
            return Err(TileError::ClientPlaced(client));
        }
        let new_leaf = self.tree.split(leaf, side, client)?;
        self.sync_widget(client);
        self.layout_changed();
        Ok(new_leaf)
    }

    /// Takes `leaf` out of the tree and parks its client in the hiding
    /// space. Removing the last leaf leaves an empty placeholder behind.
    pub fn detach_leaf(&mut self, leaf: NodeId) -> TileResult<ClientId> {
        let client = self.detach_quietly(leaf)?;
        self.sync_widget(client);
        self.layout_changed();
        Ok(client)
    }

    pub(crate) fn detach_quietly(&mut self, leaf: NodeId) -> TileResult<ClientId> {
        let client = self.tree.detach(leaf)?;
        if self.tree.is_empty() {
            let placeholder = ClientId::new();
            self.insert_placeholder(placeholder);
            self.tree.reset(placeholder);
        }
        self.forget_leaf(leaf);
        Ok(client)
    }

    /// Removes `leaf` and closes its client.
    pub fn destroy_leaf(&mut self, leaf: NodeId) -> TileResult<()> {
        let client = self.detach_quietly(leaf)?;
        self.destroy_client(client);
        self.layout_changed();
        Ok(())
    }

    /// Closes a client wherever it is.
    pub fn close_client(&mut self, id: ClientId) -> TileResult<()> {
        match self.locate(id) {
            Some(Location::Leaf(leaf)) => self.destroy_leaf(leaf),
            Some(Location::Sidebar { .. }) => {
                self.remove_from_sidebar(id);
                self.destroy_client(id);
                self.layout_changed();
                Ok(())
            }
            None if self.clients.contains_key(&id) => {
                self.destroy_client(id);
                Ok(())
            }
            None => Err(TileError::ClientNotFound(id)),
        }
    }

    pub(crate) fn destroy_client(&mut self, id: ClientId) {
        if let Some(mut client) = self.clients.remove(&id) {
            tracing::debug!("closing client {}", id);
            if let Some(widget) = client.take_widget() {
                self.host.destroy(widget);
            }
            self.events.push(TileEvent::ClientClosed(id));
        }
    }

    /// Moves a leaf's client into the first sidebar, creating the default
    /// one if there is none.
    pub fn minimize_leaf(&mut self, leaf: NodeId) -> TileResult<()> {
        let client = self.detach_quietly(leaf)?;
        let index = if self.sidebars.is_empty() {
            self.use_sidebar(self.config.default_sidebar_side)
        } else {
            0
        };
        self.sidebars[index].push(client);
        tracing::debug!("minimized {} into {} sidebar", client, self.sidebars[index].side());
        self.sync_widget(client);
        self.layout_changed();
        Ok(())
    }

    /// Exchanges the clients of two leaves.
    pub fn swap(&mut self, a: NodeId, b: NodeId) -> TileResult<()> {
        self.tree.swap(a, b)?;
        for leaf in [a, b] {
            if let Some(client) = self.tree.client_of(leaf) {
                self.sync_widget(client);
            }
        }
        self.layout_changed();
        Ok(())
    }

    /// Shifts `delta` of ratio between children `index` and `index + 1`.
    pub fn resize(&mut self, split: NodeId, index: usize, delta: f64) -> TileResult<()> {
        self.tree.resize(split, index, delta, self.config.min_ratio)?;
        self.layout_changed();
        Ok(())
    }

    /// Moves the sizer after child `index` to pixel `pos` along the split.
    pub fn drag_sizer(&mut self, split: NodeId, index: usize, pos: i32) -> TileResult<()> {
        self.tree.drag_sizer(
            split,
            index,
            pos,
            self.config.sizer_thickness,
            self.config.min_ratio,
        )?;
        self.layout_changed();
        Ok(())
    }

    /// Sets the badge count shown on a client's sidebar label.
    pub fn notify(&mut self, id: ClientId, count: u32) -> TileResult<()> {
        let client = self.clients.get_mut(&id).ok_or(TileError::ClientNotFound(id))?;
        client.set_notification_count(count);
        Ok(())
    }

    // ==================== Sidebars ====================

    /// Index of the sidebar on `side`, creating it if needed.
    pub(crate) fn use_sidebar(&mut self, side: Side) -> usize {
        match self.sidebars.iter().position(|s| s.side() == side) {
            Some(index) => index,
            None => {
                tracing::debug!("creating {} sidebar", side);
                self.sidebars.push(Sidebar::new(side));
                self.sidebars.len() - 1
            }
        }
    }

    /// Removes the sidebar on `side`, closing its clients.
    pub fn remove_sidebar(&mut self, side: Side) -> TileResult<()> {
        let index = self
            .sidebars
            .iter()
            .position(|s| s.side() == side)
            .ok_or(TileError::NoSidebar(side))?;
        if self
            .popup
            .displayed
            .is_some_and(|open| self.sidebars[index].contains(open))
        {
            self.force_clear_sidebar();
        }
        let sidebar = self.sidebars.remove(index);
        for client in sidebar.clients() {
            self.destroy_client(client);
        }
        self.layout_changed();
        Ok(())
    }

    /// Takes a client out of its sidebar, dropping the sidebar once empty.
    pub(crate) fn remove_from_sidebar(&mut self, id: ClientId) -> Option<Side> {
        let index = self.sidebars.iter().position(|s| s.contains(id))?;
        self.force_clear_sidebar();
        let sidebar = &mut self.sidebars[index];
        let side = sidebar.side();
        sidebar.remove(id);
        if sidebar.is_empty() {
            tracing::debug!("{} sidebar is empty, removing it", side);
            self.sidebars.remove(index);
        }
        Some(side)
    }

    // ==================== Bookkeeping ====================

    /// Tells the host where a client's widget belongs now.
    pub(crate) fn sync_widget(&mut self, id: ClientId) {
        let location = self.locate(id);
        let displayed = self.popup.displayed == Some(id);
        let Some(widget) = self.clients.get(&id).and_then(Client::widget) else {
            return;
        };
        match location {
            Some(Location::Leaf(leaf)) => {
                self.host.reparent(widget, Parent::Leaf(leaf));
                self.host.show(widget);
            }
            Some(Location::Sidebar { .. }) => {
                self.host.reparent(widget, Parent::Popup);
                if displayed {
                    self.host.show(widget);
                } else {
                    self.host.hide(widget);
                }
            }
            None => {
                self.host.reparent(widget, Parent::HidingSpace);
                self.host.hide(widget);
            }
        }
    }

    pub(crate) fn focused_leaf(&self) -> Option<NodeId> {
        match self.focus.current {
            Some(Focus::Leaf(leaf)) if self.tree.is_leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    fn forget_leaf(&mut self, leaf: NodeId) {
        if self.focus.current == Some(Focus::Leaf(leaf)) {
            self.focus.current = None;
        }
        if self.focus.previous_leaf == Some(leaf) {
            self.focus.previous_leaf = None;
        }
    }

    pub(crate) fn layout_changed(&mut self) {
        self.do_layout();
        self.events.push(TileEvent::LayoutChanged);
    }
}
