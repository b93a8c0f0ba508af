use serde::{Deserialize, Deserializer, Serialize};

/// One blocklist subscription as stored by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdListEntry {
    pub id: i64,
    pub address: String,
    #[serde(deserialize_with = "flag")]
    pub enabled: bool,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub groups: Option<Vec<i64>>,
}

impl AdListEntry {
    pub fn new(id: i64, address: impl Into<String>, enabled: bool) -> Self {
        Self {
            id,
            address: address.into(),
            enabled,
            comment: None,
            groups: None,
        }
    }
}

/// Pi-hole sends `enabled` as 0/1; some versions send a JSON bool.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
        Flag::Text(s) => !matches!(s.trim(), "" | "0" | "false"),
    })
}
