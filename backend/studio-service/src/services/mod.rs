//! Business logic for studio-service.
//!
//! Services own a `PgPool` plus optional collaborators (cache, vault, storage
//! client) and are constructed per request by the handlers. Writes that must
//! land together with their activity-log entry share one transaction.

pub mod activity;
pub mod brands;
pub mod content;
pub mod hashtags;
pub mod media;
pub mod oauth;
pub mod publish;
pub mod social_accounts;

pub use activity::{ActivityService, NewActivity};
pub use brands::BrandService;
pub use content::{ContentDetail, ContentService, PublishMode};
pub use hashtags::HashtagService;
pub use media::MediaService;
pub use oauth::OAuthService;
pub use publish::{DispatchOutcome, Dispatcher, HttpDispatcher};
pub use social_accounts::SocialAccountService;
