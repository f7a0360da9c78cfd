use serde::{Deserialize, Serialize};

/// JSON shape of one entry in a media-server `GET /Items` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "Type")]
    pub kind: Option<String>,
}

/// JSON shape for `GET /Items`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryItemList {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub total_record_count: Option<u64>,
}
