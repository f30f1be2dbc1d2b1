//! HTTP handlers for the studio API.
//!
//! Handlers stay thin: deserialize, construct the service for the request,
//! delegate, serialize. Domain rules live in `services`; errors render
//! through `AppError`'s `ResponseError` impl.
pub mod brands;
pub mod content;
pub mod hashtag_presets;
pub mod media;
pub mod oauth;
pub mod social_accounts;

pub use brands::{
    activate_brand, archive_brand, create_brand, get_brand, get_brand_activity, list_brands,
    set_publishing_defaults, update_brand,
};
pub use content::{
    archive_content, create_content, get_content, list_content, publish_content, update_content,
};
pub use hashtag_presets::{create_preset, delete_preset, list_presets, update_preset};
pub use media::{finalize_upload, get_asset, start_upload};
pub use oauth::{oauth_authorize, oauth_callback};
pub use social_accounts::{
    connect_account, disconnect_account, get_account, list_accounts, remove_account,
};

use serde::{Deserialize, Deserializer};

/// Pagination query parameters with the API-wide defaults.
#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl PaginationParams {
    /// Clamp to the allowed window: limit 1..=100, offset >= 0.
    pub fn clamp(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// Deserialize a PATCH field that distinguishes "absent" (outer `None`)
/// from "explicitly null" (inner `None`). Pair with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_to_the_allowed_window() {
        let params = PaginationParams {
            limit: 500,
            offset: -3,
        };
        assert_eq!(params.clamp(), (100, 0));

        let params = PaginationParams {
            limit: 0,
            offset: 40,
        };
        assert_eq!(params.clamp(), (1, 40));

        assert_eq!(PaginationParams::default().clamp(), (20, 0));
    }

    #[test]
    fn double_option_distinguishes_null_from_absent() {
        #[derive(Deserialize)]
        struct Patch {
            #[serde(default, deserialize_with = "double_option")]
            name: Option<Option<String>>,
        }

        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.name, None);

        let cleared: Patch = serde_json::from_str(r#"{"name":null}"#).unwrap();
        assert_eq!(cleared.name, Some(None));

        let set: Patch = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(set.name, Some(Some("x".to_string())));
    }
}
