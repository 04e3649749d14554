use serde::{Deserialize, Serialize};

/// Embedded mindmap export, as written into the page by the exporter.
///
/// Every field is optional on the wire; the tree model decides what is fatal.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct MindmapDocument {
    #[serde(default)]
    pub sheets: Vec<SheetDoc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct SheetDoc {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub root_topic: Option<TopicDoc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub(crate) struct TopicDoc {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub hyperlink: Option<String>,

    /// Exporters emit `null` for leaves as often as `[]`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub children: Vec<TopicDoc>,

    #[serde(default)]
    pub branch_folded: Option<bool>,
}

fn null_as_empty<'de, D>(de: D) -> Result<Vec<TopicDoc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<TopicDoc>>::deserialize(de)?.unwrap_or_default())
}
