use serde::{Deserialize, Serialize};

/// A user category.
///
/// `order` doubles as the key novels use to reference the category inside
/// the same archive; it means nothing outside of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub name: String,
    pub order: i32,
}

impl CategoryRecord {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self { name: name.into(), order }
    }
}
