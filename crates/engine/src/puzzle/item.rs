use serde::Serialize;

pub const DEFAULT_ICON_COLOR: [u8; 3] = [230, 230, 230];

/// An acquirable token. Items move between containers, the inventory and the
/// combination resolver; they are never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub icon_color: [u8; 3],
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            icon_color: DEFAULT_ICON_COLOR,
        }
    }

    pub fn with_icon_color(mut self, icon_color: [u8; 3]) -> Self {
        self.icon_color = icon_color;
        self
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name == name
    }
}
