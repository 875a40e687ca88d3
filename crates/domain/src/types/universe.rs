//! Static universe reference data (type → group → category)

use serde::{Deserialize, Serialize};

/// Top level of the type hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveCategory {
    pub id: i64,
    pub name: String,
}

/// Group of types inside a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveGroup {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
}

/// Item type, e.g. a blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EveType {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
}

/// A type resolved together with its group and category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniverseType {
    pub type_id: i64,
    pub type_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub category_id: i64,
    pub category_name: String,
}

impl UniverseType {
    /// Split into the three rows in insertion order
    pub fn into_rows(self) -> (EveCategory, EveGroup, EveType) {
        (
            EveCategory { id: self.category_id, name: self.category_name },
            EveGroup { id: self.group_id, category_id: self.category_id, name: self.group_name },
            EveType { id: self.type_id, group_id: self.group_id, name: self.type_name },
        )
    }
}
