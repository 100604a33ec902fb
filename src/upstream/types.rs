use serde::Deserialize;

use crate::cache::{AssetDetail, ExifSummary, TagSummary};

/// Album payload from `GET /api/albums/{id}?withoutAssets=false`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AlbumResponse {
    pub id: String,
    #[serde(default)]
    pub album_name: String,
    #[serde(default)]
    pub asset_count: u64,
    #[serde(default)]
    pub assets: Option<AssetListing>,
}

/// The album's `assets` field has shifted shape across upstream versions:
/// a `{ items: [...] }` wrapper, a bare list of asset objects, or a bare
/// list of id strings. All three are accepted.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum AssetListing {
    Wrapped { items: Vec<AssetEnvelope> },
    Objects(Vec<AssetEnvelope>),
    Ids(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetEnvelope {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub asset_id: Option<String>,
}

impl AssetListing {
    pub(crate) fn into_ids(self) -> Vec<String> {
        match self {
            AssetListing::Wrapped { items } | AssetListing::Objects(items) => items
                .into_iter()
                .filter_map(|envelope| envelope.id.or(envelope.asset_id))
                .filter(|id| !id.is_empty())
                .collect(),
            AssetListing::Ids(ids) => ids.into_iter().filter(|id| !id.is_empty()).collect(),
        }
    }
}

/// Asset payload from `GET /api/assets/{id}`; includes EXIF and tags.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssetResponse {
    pub id: String,
    #[serde(default)]
    pub original_file_name: Option<String>,
    #[serde(default)]
    pub exif_info: Option<ExifSummary>,
    #[serde(default)]
    pub tags: Option<Vec<TagSummary>>,
}

impl From<AssetResponse> for AssetDetail {
    fn from(response: AssetResponse) -> Self {
        AssetDetail {
            id: response.id,
            original_file_name: response.original_file_name,
            exif: response.exif_info.unwrap_or_default(),
            tags: response.tags.unwrap_or_default(),
        }
    }
}
