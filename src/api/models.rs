use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub id: i64,
    #[serde(alias = "title", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(alias = "content", default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub category: String,
    #[serde(
        default,
        deserialize_with = "non_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub group_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created_at: String,
}

impl Notice {
    /// Creation time in the local timezone, if the backend sent an RFC 3339 stamp.
    pub fn created(&self) -> Option<DateTime<Local>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    }
}

fn null_as_empty<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

fn non_empty<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(de)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Body of `POST /notices`.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewNotice {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_groups: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GroupSettings {
    pub groups: Vec<String>,
}

/// One refresh cycle's worth of backend state, applied as a unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub notices: Vec<Notice>,
    pub official_groups: Vec<String>,
}
