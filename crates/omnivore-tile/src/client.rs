//! Clients: the user widgets placed in leaves and sidebars.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a client, stable across layout save/restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(Uuid);

impl ClientId {
    /// Creates a new unique client ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(text: &str) -> Option<Self> {
        Uuid::parse_str(text).ok().map(Self)
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chrome options for a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub title: String,
    pub show_title: bool,
    pub use_close_button: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            show_title: true,
            use_close_button: true,
        }
    }
}

impl ClientOptions {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// A user widget plus its chrome.
///
/// A client without a widget is an empty placeholder: the fresh leaf of a
/// new manager, or a leaf restored from a layout whose UUID nobody knew.
/// `add` fills placeholders before it splits anything.
#[derive(Debug)]
pub struct Client<W> {
    id: ClientId,
    pub title: String,
    pub show_title: bool,
    pub use_close_button: bool,
    notification_count: u32,
    widget: Option<W>,
}

impl<W> Client<W> {
    pub fn new(id: ClientId, widget: W, options: ClientOptions) -> Self {
        Self {
            id,
            title: options.title,
            show_title: options.show_title,
            use_close_button: options.use_close_button,
            notification_count: 0,
            widget: Some(widget),
        }
    }

    pub fn placeholder(id: ClientId) -> Self {
        Self {
            id,
            title: String::new(),
            show_title: true,
            use_close_button: true,
            notification_count: 0,
            widget: None,
        }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    pub fn widget(&self) -> Option<&W> {
        self.widget.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.widget.is_none()
    }

    /// Label shown in a sidebar; falls back to the UUID.
    pub fn popup_name(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            self.title.clone()
        }
    }

    pub fn notification_count(&self) -> u32 {
        self.notification_count
    }

    pub(crate) fn set_notification_count(&mut self, count: u32) {
        self.notification_count = count;
    }

    /// Swaps in a new widget, returning the old one.
    pub(crate) fn replace_widget(&mut self, widget: W, options: ClientOptions) -> Option<W> {
        self.title = options.title;
        self.show_title = options.show_title;
        self.use_close_button = options.use_close_button;
        self.widget.replace(widget)
    }

    pub(crate) fn take_widget(&mut self) -> Option<W> {
        self.widget.take()
    }
}
