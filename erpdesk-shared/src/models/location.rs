use serde::{Deserialize, Serialize};

/// A warehouse, branch, or factory known to the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Location identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Location type as reported by the server (e.g. `factory`, `store`).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}
