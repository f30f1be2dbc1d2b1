/// Data models for studio-service
///
/// This module defines structures for:
/// - Brand: a brand profile inside a workspace, with readiness tracking
/// - SocialAccount: an OAuth-connected platform account (sealed credentials)
/// - HashtagPreset: reusable tag sets scoped to a brand
/// - ContentItem / ContentTarget: composed content and per-account outcomes
/// - MediaAsset: presigned-upload lifecycle records
/// - ActivityEntry: the append-only activity log
///
/// Statuses are stored as lowercase strings in Postgres; each has a typed
/// enum with `as_str` / `TryFrom<&str>` plus the legal transition edges.
use crate::error::AppError;
use chrono::{DateTime, Utc};
use platform_rules::{ContentType, Platform};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

// ========================================
// Brand
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrandStatus {
    Draft,
    Active,
    Archived,
}

impl BrandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrandStatus::Draft => "draft",
            BrandStatus::Active => "active",
            BrandStatus::Archived => "archived",
        }
    }

    /// Legal edges: Draft -> Active, Active -> Archived, Archived -> Active.
    pub fn can_transition_to(&self, next: BrandStatus) -> bool {
        matches!(
            (self, next),
            (BrandStatus::Draft, BrandStatus::Active)
                | (BrandStatus::Active, BrandStatus::Archived)
                | (BrandStatus::Archived, BrandStatus::Active)
        )
    }
}

impl TryFrom<&str> for BrandStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "draft" => Ok(BrandStatus::Draft),
            "active" => Ok(BrandStatus::Active),
            "archived" => Ok(BrandStatus::Archived),
            _ => Err(AppError::BadRequest("invalid brand status".into())),
        }
    }
}

/// Brand database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Brand {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub name: String,
    pub slug: String,
    pub status: String,
    pub description: Option<String>,
    pub logo_asset_id: Option<Uuid>,
    /// Style attributes (palette, fonts, tone) as free-form JSON
    pub style: serde_json::Value,
    pub timezone: String,
    pub profile_completed: bool,
    pub publishing_defaults: Option<serde_json::Value>,
    pub has_social_account: bool,
    /// Derived readiness score, 0-100
    pub readiness_score: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Brand {
    pub fn get_status(&self) -> BrandStatus {
        BrandStatus::try_from(self.status.as_str()).unwrap_or(BrandStatus::Draft)
    }
}

// ========================================
// Social accounts
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Disconnected,
    Removed,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Disconnected => "disconnected",
            AccountStatus::Removed => "removed",
        }
    }

    /// One-way lifecycle: Active -> Disconnected -> Removed, Active -> Removed.
    /// Reconnecting a disconnected account is a service-level refresh, not a
    /// backward transition request from the API.
    pub fn can_transition_to(&self, next: AccountStatus) -> bool {
        matches!(
            (self, next),
            (AccountStatus::Active, AccountStatus::Disconnected)
                | (AccountStatus::Active, AccountStatus::Removed)
                | (AccountStatus::Disconnected, AccountStatus::Removed)
        )
    }
}

impl TryFrom<&str> for AccountStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "disconnected" => Ok(AccountStatus::Disconnected),
            "removed" => Ok(AccountStatus::Removed),
            _ => Err(AppError::BadRequest("invalid account status".into())),
        }
    }
}

/// Social account database entity.
///
/// Deliberately does not implement `Serialize`: the sealed credential bytes
/// must never reach a response body or the cache. Use
/// `SocialAccountResponse` for anything client-facing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SocialAccount {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Uuid,
    pub platform: String,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// AES-256-GCM sealed credentials (credential-vault layout)
    pub credentials: Vec<u8>,
    pub status: String,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SocialAccount {
    pub fn get_status(&self) -> AccountStatus {
        AccountStatus::try_from(self.status.as_str()).unwrap_or(AccountStatus::Removed)
    }

    pub fn get_platform(&self) -> Option<Platform> {
        Platform::from_str(&self.platform)
    }
}

/// Client-facing view of a social account.
#[derive(Debug, Clone, Serialize)]
pub struct SocialAccountResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Uuid,
    pub platform: String,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub status: String,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
}

impl From<SocialAccount> for SocialAccountResponse {
    fn from(account: SocialAccount) -> Self {
        Self {
            id: account.id,
            workspace_id: account.workspace_id,
            brand_id: account.brand_id,
            platform: account.platform,
            external_id: account.external_id,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
            status: account.status,
            connected_at: account.connected_at,
            disconnected_at: account.disconnected_at,
        }
    }
}

// ========================================
// Hashtag presets
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HashtagPreset {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ========================================
// Content
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
    Draft,
    Scheduled,
    Published,
    PartiallyPublished,
    Failed,
    Archived,
}

impl ContentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Scheduled => "scheduled",
            ContentStatus::Published => "published",
            ContentStatus::PartiallyPublished => "partially_published",
            ContentStatus::Failed => "failed",
            ContentStatus::Archived => "archived",
        }
    }

    pub fn can_transition_to(&self, next: ContentStatus) -> bool {
        use ContentStatus::*;
        match (self, next) {
            (Draft, Scheduled) | (Draft, Published) | (Draft, PartiallyPublished)
            | (Draft, Failed) => true,
            // Unschedule back to draft is allowed
            (Scheduled, Draft) | (Scheduled, Published) | (Scheduled, PartiallyPublished)
            | (Scheduled, Failed) => true,
            // A failed publish can be retried from the composer
            (Failed, Published) | (Failed, PartiallyPublished) | (Failed, Scheduled)
            | (Failed, Failed) => true,
            (Archived, _) => false,
            (_, Archived) => true,
            _ => false,
        }
    }
}

impl TryFrom<&str> for ContentStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "draft" => Ok(ContentStatus::Draft),
            "scheduled" => Ok(ContentStatus::Scheduled),
            "published" => Ok(ContentStatus::Published),
            "partially_published" => Ok(ContentStatus::PartiallyPublished),
            "failed" => Ok(ContentStatus::Failed),
            "archived" => Ok(ContentStatus::Archived),
            _ => Err(AppError::BadRequest("invalid content status".into())),
        }
    }
}

/// Reference to an uploaded media asset inside a content item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    pub asset_id: Uuid,
    /// "image" or "video"
    pub kind: String,
    pub position: i32,
}

/// Content item database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentItem {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Uuid,
    /// SCREAMING_SNAKE content type string; nullable while drafting
    pub content_type: Option<String>,
    pub caption: Option<String>,
    pub tags: Vec<String>,
    pub media: Json<Vec<MediaRef>>,
    /// Escape hatch: publish without media even where optional
    pub without_media: bool,
    /// Deferred media resolution by exact file name at publish time
    pub media_lookup_id: Option<String>,
    pub status: String,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn get_status(&self) -> ContentStatus {
        ContentStatus::try_from(self.status.as_str()).unwrap_or(ContentStatus::Draft)
    }

    pub fn get_content_type(&self) -> Option<ContentType> {
        self.content_type
            .as_deref()
            .and_then(ContentType::from_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Pending,
    Published,
    Failed,
}

impl TargetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetStatus::Pending => "pending",
            TargetStatus::Published => "published",
            TargetStatus::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TargetStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "pending" => Ok(TargetStatus::Pending),
            "published" => Ok(TargetStatus::Published),
            "failed" => Ok(TargetStatus::Failed),
            _ => Err(AppError::BadRequest("invalid target status".into())),
        }
    }
}

/// Per-(content, account) publish outcome
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentTarget {
    pub id: Uuid,
    pub content_id: Uuid,
    pub social_account_id: Uuid,
    pub status: String,
    pub external_post_id: Option<String>,
    pub error: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentTarget {
    pub fn get_status(&self) -> TargetStatus {
        TargetStatus::try_from(self.status.as_str()).unwrap_or(TargetStatus::Pending)
    }
}

// ========================================
// Media assets
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    Pending,
    Ready,
    Failed,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Pending => "pending",
            AssetStatus::Ready => "ready",
            AssetStatus::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for AssetStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "pending" => Ok(AssetStatus::Pending),
            "ready" => Ok(AssetStatus::Ready),
            "failed" => Ok(AssetStatus::Failed),
            _ => Err(AppError::BadRequest("invalid asset status".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Image,
    Video,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Image => "image",
            ContentKind::Video => "video",
        }
    }
}

impl TryFrom<&str> for ContentKind {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "image" => Ok(ContentKind::Image),
            "video" => Ok(ContentKind::Video),
            _ => Err(AppError::BadRequest("invalid media kind".into())),
        }
    }
}

/// Media asset database entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MediaAsset {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub file_name: String,
    pub content_kind: String,
    pub mime_type: String,
    pub byte_size: i64,
    pub storage_key: String,
    pub status: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_ms: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaAsset {
    pub fn get_status(&self) -> AssetStatus {
        AssetStatus::try_from(self.status.as_str()).unwrap_or(AssetStatus::Pending)
    }
}

// ========================================
// Activity log
// ========================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub brand_id: Option<Uuid>,
    pub actor_id: Uuid,
    /// Dotted verb, e.g. "brand.created" or "account.connected"
    pub action: String,
    pub subject_type: String,
    pub subject_id: Uuid,
    pub detail: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brand_status_edges() {
        assert!(BrandStatus::Draft.can_transition_to(BrandStatus::Active));
        assert!(BrandStatus::Active.can_transition_to(BrandStatus::Archived));
        assert!(BrandStatus::Archived.can_transition_to(BrandStatus::Active));

        assert!(!BrandStatus::Draft.can_transition_to(BrandStatus::Archived));
        assert!(!BrandStatus::Active.can_transition_to(BrandStatus::Draft));
        assert!(!BrandStatus::Archived.can_transition_to(BrandStatus::Draft));
    }

    #[test]
    fn account_status_is_one_way() {
        assert!(AccountStatus::Active.can_transition_to(AccountStatus::Disconnected));
        assert!(AccountStatus::Active.can_transition_to(AccountStatus::Removed));
        assert!(AccountStatus::Disconnected.can_transition_to(AccountStatus::Removed));

        assert!(!AccountStatus::Disconnected.can_transition_to(AccountStatus::Active));
        assert!(!AccountStatus::Removed.can_transition_to(AccountStatus::Active));
        assert!(!AccountStatus::Removed.can_transition_to(AccountStatus::Disconnected));
    }

    #[test]
    fn content_status_edges() {
        use ContentStatus::*;

        assert!(Draft.can_transition_to(Scheduled));
        assert!(Draft.can_transition_to(Published));
        assert!(Scheduled.can_transition_to(Draft));
        assert!(Scheduled.can_transition_to(PartiallyPublished));
        assert!(Failed.can_transition_to(Published));
        assert!(Published.can_transition_to(Archived));

        assert!(!Archived.can_transition_to(Draft));
        assert!(!Archived.can_transition_to(Published));
        assert!(!Published.can_transition_to(Draft));
        assert!(!Published.can_transition_to(Scheduled));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            ContentStatus::Draft,
            ContentStatus::Scheduled,
            ContentStatus::Published,
            ContentStatus::PartiallyPublished,
            ContentStatus::Failed,
            ContentStatus::Archived,
        ] {
            assert_eq!(ContentStatus::try_from(status.as_str()).unwrap(), status);
        }
        for status in [
            AccountStatus::Active,
            AccountStatus::Disconnected,
            AccountStatus::Removed,
        ] {
            assert_eq!(AccountStatus::try_from(status.as_str()).unwrap(), status);
        }
        assert!(ContentStatus::try_from("queued").is_err());
        assert!(AccountStatus::try_from("ACTIVE").is_err());
    }

    #[test]
    fn partially_published_wire_form() {
        assert_eq!(
            serde_json::to_string(&ContentStatus::PartiallyPublished).unwrap(),
            "\"partially_published\""
        );
    }
}
