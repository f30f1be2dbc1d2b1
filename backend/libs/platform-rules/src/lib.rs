//! Platform compatibility rules for Atelier.
//!
//! A static mapping from (platform, form factor) to caption limits and media
//! requirements, plus the content-type matrix that tells the composer whether
//! an internal content type publishes natively, degraded, or not at all on a
//! given platform.
//!
//! The tables are embedded configuration: lookups allocate nothing and never
//! fail. Absence of a rule is the "unsupported" signal — callers must exclude
//! the account from selection rather than expect an error.

use serde::{Deserialize, Serialize};

// ========================================
// Platforms and form factors
// ========================================

/// Social platform a brand can connect an account on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Facebook,
    TikTok,
    LinkedIn,
    X,
    YouTube,
    Pinterest,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Instagram,
        Platform::Facebook,
        Platform::TikTok,
        Platform::LinkedIn,
        Platform::X,
        Platform::YouTube,
        Platform::Pinterest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::TikTok => "tiktok",
            Platform::LinkedIn => "linkedin",
            Platform::X => "x",
            Platform::YouTube => "youtube",
            Platform::Pinterest => "pinterest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "instagram" => Some(Platform::Instagram),
            "facebook" => Some(Platform::Facebook),
            "tiktok" => Some(Platform::TikTok),
            "linkedin" => Some(Platform::LinkedIn),
            "x" => Some(Platform::X),
            "youtube" => Some(Platform::YouTube),
            "pinterest" => Some(Platform::Pinterest),
            _ => None,
        }
    }
}

/// Content shape category used to key the platform rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormFactor {
    FeedPost,
    Story,
    VerticalVideo,
    LongVideo,
    Pin,
}

impl FormFactor {
    pub const ALL: [FormFactor; 5] = [
        FormFactor::FeedPost,
        FormFactor::Story,
        FormFactor::VerticalVideo,
        FormFactor::LongVideo,
        FormFactor::Pin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormFactor::FeedPost => "FEED_POST",
            FormFactor::Story => "STORY",
            FormFactor::VerticalVideo => "VERTICAL_VIDEO",
            FormFactor::LongVideo => "LONG_VIDEO",
            FormFactor::Pin => "PIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "FEED_POST" => Some(FormFactor::FeedPost),
            "STORY" => Some(FormFactor::Story),
            "VERTICAL_VIDEO" => Some(FormFactor::VerticalVideo),
            "LONG_VIDEO" => Some(FormFactor::LongVideo),
            "PIN" => Some(FormFactor::Pin),
            _ => None,
        }
    }
}

// ========================================
// Platform rules table
// ========================================

/// Per-(platform, form factor) publishing constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformRule {
    /// Maximum caption length in characters. Zero means the form factor
    /// carries no caption at all (e.g. stories).
    pub caption_limit: usize,
    /// Whether at least one media item is mandatory.
    pub requires_media: bool,
}

const fn rule(caption_limit: usize, requires_media: bool) -> PlatformRule {
    PlatformRule {
        caption_limit,
        requires_media,
    }
}

/// Form-factor-specific entry, if the platform declares one.
fn specific_rule(platform: Platform, form_factor: FormFactor) -> Option<PlatformRule> {
    use FormFactor::*;
    use Platform::*;

    match (platform, form_factor) {
        (Instagram, Story) => Some(rule(0, true)),
        (Facebook, Story) => Some(rule(0, true)),
        (TikTok, VerticalVideo) => Some(rule(2200, true)),
        (LinkedIn, FeedPost) => Some(rule(3000, false)),
        (LinkedIn, LongVideo) => Some(rule(3000, true)),
        (X, FeedPost) => Some(rule(280, false)),
        (X, VerticalVideo) => Some(rule(280, true)),
        (X, LongVideo) => Some(rule(280, true)),
        (YouTube, VerticalVideo) => Some(rule(100, true)),
        (YouTube, LongVideo) => Some(rule(5000, true)),
        _ => None,
    }
}

/// The platform's DEFAULT entry, applied when no form-factor-specific entry
/// exists. Platforms without a DEFAULT support only their explicit entries.
fn default_rule(platform: Platform) -> Option<PlatformRule> {
    match platform {
        Platform::Instagram => Some(rule(2200, true)),
        Platform::Facebook => Some(rule(63_206, false)),
        Platform::Pinterest => Some(rule(500, true)),
        Platform::TikTok | Platform::LinkedIn | Platform::X | Platform::YouTube => None,
    }
}

/// Resolve the rule for a (platform, form factor) pair.
///
/// A form-factor-specific entry wins; otherwise the platform's DEFAULT entry
/// applies; otherwise the pair is unsupported and `None` is returned.
pub fn rule_for(platform: Platform, form_factor: FormFactor) -> Option<PlatformRule> {
    specific_rule(platform, form_factor).or_else(|| default_rule(platform))
}

/// Caption character limit for the pair, `None` when unsupported.
pub fn caption_limit_for(platform: Platform, form_factor: FormFactor) -> Option<usize> {
    rule_for(platform, form_factor).map(|r| r.caption_limit)
}

/// Whether media is mandatory for the pair, `None` when unsupported.
pub fn requires_media(platform: Platform, form_factor: FormFactor) -> Option<bool> {
    rule_for(platform, form_factor).map(|r| r.requires_media)
}

/// Whether the platform supports the form factor at all.
pub fn supports(platform: Platform, form_factor: FormFactor) -> bool {
    rule_for(platform, form_factor).is_some()
}

/// Minimum caption limit across a set of platforms for one form factor.
///
/// Returns `None` if the set is empty or any platform is unsupported for the
/// form factor — the caller is expected to exclude unsupported accounts
/// before asking for a combined limit.
pub fn min_caption_limit<I>(platforms: I, form_factor: FormFactor) -> Option<usize>
where
    I: IntoIterator<Item = Platform>,
{
    let mut min: Option<usize> = None;
    for platform in platforms {
        let limit = caption_limit_for(platform, form_factor)?;
        min = Some(match min {
            Some(current) => current.min(limit),
            None => limit,
        });
    }
    min
}

// ========================================
// Content type matrix
// ========================================

/// Internal content type the composer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentType {
    ImagePost,
    VideoPost,
    ShortVideo,
    StorySet,
    TextPost,
    LinkPost,
}

impl ContentType {
    pub const ALL: [ContentType; 6] = [
        ContentType::ImagePost,
        ContentType::VideoPost,
        ContentType::ShortVideo,
        ContentType::StorySet,
        ContentType::TextPost,
        ContentType::LinkPost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::ImagePost => "IMAGE_POST",
            ContentType::VideoPost => "VIDEO_POST",
            ContentType::ShortVideo => "SHORT_VIDEO",
            ContentType::StorySet => "STORY_SET",
            ContentType::TextPost => "TEXT_POST",
            ContentType::LinkPost => "LINK_POST",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "IMAGE_POST" => Some(ContentType::ImagePost),
            "VIDEO_POST" => Some(ContentType::VideoPost),
            "SHORT_VIDEO" => Some(ContentType::ShortVideo),
            "STORY_SET" => Some(ContentType::StorySet),
            "TEXT_POST" => Some(ContentType::TextPost),
            "LINK_POST" => Some(ContentType::LinkPost),
            _ => None,
        }
    }

    /// The form factor this content type is keyed under in the rules table.
    pub fn form_factor(&self) -> FormFactor {
        match self {
            ContentType::ImagePost | ContentType::TextPost | ContentType::LinkPost => {
                FormFactor::FeedPost
            }
            ContentType::VideoPost => FormFactor::LongVideo,
            ContentType::ShortVideo => FormFactor::VerticalVideo,
            ContentType::StorySet => FormFactor::Story,
        }
    }

    /// Content types that by construction carry no media attachment.
    pub fn is_media_less(&self) -> bool {
        matches!(self, ContentType::TextPost | ContentType::LinkPost)
    }
}

/// Support level of a content type on a platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Full,
    Degraded,
    Unsupported,
}

/// Matrix answer for one (content type, platform) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatrixEntry {
    pub level: SupportLevel,
    /// Human-readable delivery note shown in the composer.
    pub note: Option<&'static str>,
}

impl MatrixEntry {
    const fn full() -> Self {
        MatrixEntry {
            level: SupportLevel::Full,
            note: None,
        }
    }

    const fn degraded(note: &'static str) -> Self {
        MatrixEntry {
            level: SupportLevel::Degraded,
            note: Some(note),
        }
    }

    const fn unsupported(note: Option<&'static str>) -> Self {
        MatrixEntry {
            level: SupportLevel::Unsupported,
            note,
        }
    }
}

/// Curated degradation notes for pairs that publish, but not natively.
fn degradation(content_type: ContentType, platform: Platform) -> Option<&'static str> {
    use ContentType::*;
    use Platform::*;

    match (content_type, platform) {
        (VideoPost, Instagram) => Some("feed video is delivered as a Reel"),
        (ShortVideo, Facebook) => Some("delivered as a Facebook Reel"),
        (ShortVideo, X) => Some("delivered as a regular video post"),
        (ImagePost, Pinterest) => Some("delivered as a standard pin"),
        (StorySet, Pinterest) => Some("delivered as an idea pin"),
        (VideoPost, Pinterest) => Some("delivered as a video pin"),
        _ => None,
    }
}

/// Answer whether (and how) a content type publishes on a platform.
///
/// Derivation order: a pair with no rule is unsupported; a media-less content
/// type on a platform that mandates media is unsupported; curated pairs are
/// degraded with a note; everything else is fully supported.
pub fn matrix_entry(content_type: ContentType, platform: Platform) -> MatrixEntry {
    let form_factor = content_type.form_factor();

    let rule = match rule_for(platform, form_factor) {
        Some(rule) => rule,
        None => return MatrixEntry::unsupported(None),
    };

    if rule.requires_media && content_type.is_media_less() {
        return MatrixEntry::unsupported(Some("platform requires at least one media item"));
    }

    match degradation(content_type, platform) {
        Some(note) => MatrixEntry::degraded(note),
        None => MatrixEntry::full(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_entry_wins_over_default() {
        // Instagram stories have their own entry; the DEFAULT would allow a
        // 2200-character caption.
        assert_eq!(
            rule_for(Platform::Instagram, FormFactor::Story),
            Some(rule(0, true))
        );
        assert_eq!(
            rule_for(Platform::Instagram, FormFactor::FeedPost),
            Some(rule(2200, true))
        );
    }

    #[test]
    fn default_entry_covers_missing_form_factors() {
        // No LONG_VIDEO entry for Facebook: the DEFAULT applies.
        assert_eq!(
            caption_limit_for(Platform::Facebook, FormFactor::LongVideo),
            Some(63_206)
        );
        assert_eq!(
            requires_media(Platform::Facebook, FormFactor::LongVideo),
            Some(false)
        );
    }

    #[test]
    fn platforms_without_default_reject_unknown_form_factors() {
        assert!(!supports(Platform::TikTok, FormFactor::FeedPost));
        assert!(!supports(Platform::YouTube, FormFactor::Story));
        assert!(!supports(Platform::X, FormFactor::Pin));
        assert!(!supports(Platform::LinkedIn, FormFactor::VerticalVideo));
    }

    #[test]
    fn lookup_is_total_over_the_cross_product() {
        // Every pair either resolves to a rule or signals unsupported; the
        // two accessors must agree and never panic.
        for platform in Platform::ALL {
            for form_factor in FormFactor::ALL {
                let rule = rule_for(platform, form_factor);
                assert_eq!(
                    caption_limit_for(platform, form_factor),
                    rule.map(|r| r.caption_limit)
                );
                assert_eq!(
                    requires_media(platform, form_factor),
                    rule.map(|r| r.requires_media)
                );
                assert_eq!(supports(platform, form_factor), rule.is_some());
            }
        }
    }

    #[test]
    fn min_caption_limit_picks_the_tightest_platform() {
        let limit = min_caption_limit(
            [Platform::Instagram, Platform::Facebook, Platform::X],
            FormFactor::FeedPost,
        );
        assert_eq!(limit, Some(280));
    }

    #[test]
    fn min_caption_limit_fails_on_unsupported_member() {
        // TikTok does not carry feed posts, so no combined limit exists.
        let limit = min_caption_limit(
            [Platform::Instagram, Platform::TikTok],
            FormFactor::FeedPost,
        );
        assert_eq!(limit, None);
        assert_eq!(min_caption_limit([], FormFactor::FeedPost), None);
    }

    #[test]
    fn matrix_rejects_media_less_types_on_media_mandatory_platforms() {
        let entry = matrix_entry(ContentType::TextPost, Platform::Instagram);
        assert_eq!(entry.level, SupportLevel::Unsupported);
        assert!(entry.note.is_some());

        // Facebook feed posts do not mandate media, so text is fine there.
        let entry = matrix_entry(ContentType::TextPost, Platform::Facebook);
        assert_eq!(entry.level, SupportLevel::Full);
    }

    #[test]
    fn matrix_marks_degraded_deliveries() {
        let entry = matrix_entry(ContentType::ShortVideo, Platform::Facebook);
        assert_eq!(entry.level, SupportLevel::Degraded);
        assert_eq!(entry.note, Some("delivered as a Facebook Reel"));

        let entry = matrix_entry(ContentType::ShortVideo, Platform::TikTok);
        assert_eq!(entry.level, SupportLevel::Full);
    }

    #[test]
    fn matrix_follows_rule_absence() {
        assert_eq!(
            matrix_entry(ContentType::ImagePost, Platform::TikTok).level,
            SupportLevel::Unsupported
        );
        assert_eq!(
            matrix_entry(ContentType::StorySet, Platform::X).level,
            SupportLevel::Unsupported
        );
    }

    #[test]
    fn enum_string_forms_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_str(platform.as_str()), Some(platform));
        }
        for form_factor in FormFactor::ALL {
            assert_eq!(FormFactor::from_str(form_factor.as_str()), Some(form_factor));
        }
        for content_type in ContentType::ALL {
            assert_eq!(
                ContentType::from_str(content_type.as_str()),
                Some(content_type)
            );
        }
        assert_eq!(Platform::from_str("myspace"), None);
        assert_eq!(FormFactor::from_str("feed_post"), None);
    }

    #[test]
    fn wire_forms_match_the_api_contract() {
        assert_eq!(
            serde_json::to_string(&Platform::TikTok).unwrap(),
            "\"tiktok\""
        );
        assert_eq!(
            serde_json::to_string(&FormFactor::VerticalVideo).unwrap(),
            "\"VERTICAL_VIDEO\""
        );
        assert_eq!(
            serde_json::to_string(&ContentType::StorySet).unwrap(),
            "\"STORY_SET\""
        );
        let platform: Platform = serde_json::from_str("\"linkedin\"").unwrap();
        assert_eq!(platform, Platform::LinkedIn);
    }
}
