#![warn(missing_docs)]
//! # cyber-shield-store
//!
//! ## Purpose
//! In-memory record store for community scam reports, users and comments.
//!
//! ## Responsibilities
//! - Define the [`ScamStore`] repository interface used by the app.
//! - Provide [`MemoryStore`], a lock-guarded implementation seedable from JSON.
//! - Implement the listing helpers: trending filters, recent, newest-first.
//! - Check report fields against the report form bounds.
//!
//! ## Data flow
//! Seed JSON -> [`MemoryStore::from_json_str`] -> reads/writes through
//! [`ScamStore`] -> owned record clones handed to callers.
//!
//! ## Ownership and lifetimes
//! Every read returns owned clones so callers never hold the lock.
//!
//! ## Error model
//! Lock poisoning, bad seed data and dangling references return
//! [`StoreError`]. Concurrent writers follow last-write-wins. Report field
//! violations return [`ReportError`] before anything is stored.
//!
//! ## Security and privacy notes
//! Users carry a password digest only. Nothing is written to disk.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cyber_shield_core::{RiskAnalysisResult, utf16_len};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of scams returned by [`ScamStore::recent_scams`].
pub const DEFAULT_RECENT_LIMIT: usize = 8;

/// Filter value that disables a trending filter.
pub const FILTER_ALL: &str = "all";

const CAROUSEL_IMAGE_COUNT: u64 = 5;

const AVATAR_BASE_URL: &str = "https://i.pravatar.cc/150?u=";

/// Minimum report title length, in UTF-16 code units.
pub const MIN_TITLE_CHARS: usize = 10;

/// Maximum report title length, in UTF-16 code units.
pub const MAX_TITLE_CHARS: usize = 100;

/// Minimum report description length, in UTF-16 code units.
pub const MIN_DESCRIPTION_CHARS: usize = 50;

/// Maximum report description length, in UTF-16 code units.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// Category of reported scam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScamType {
    /// Credential or payment phishing.
    Phishing,
    /// Fake job offers.
    #[serde(rename = "Fake Job")]
    FakeJob,
    /// Investment fraud.
    Investment,
    /// Fake technical support.
    #[serde(rename = "Tech Support")]
    TechSupport,
    /// Fake delivery notices.
    Delivery,
}

impl ScamType {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Phishing => "Phishing",
            Self::FakeJob => "Fake Job",
            Self::Investment => "Investment",
            Self::TechSupport => "Tech Support",
            Self::Delivery => "Delivery",
        }
    }
}

/// Where the scam was encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Email.
    Email,
    /// A website.
    Website,
    /// Generic social media.
    #[serde(rename = "Social Media")]
    SocialMedia,
    /// Voice call.
    #[serde(rename = "Phone Call")]
    PhoneCall,
    /// SMS.
    #[serde(rename = "Text Message")]
    TextMessage,
    /// Instagram.
    Instagram,
    /// Facebook.
    Facebook,
    /// Flipkart.
    Flipkart,
    /// Blinkit.
    Blinkit,
    /// Zepto.
    Zepto,
    /// LinkedIn.
    LinkedIn,
    /// Freelancing marketplaces.
    #[serde(rename = "Freelancing Website")]
    FreelancingWebsite,
    /// Amazon.
    Amazon,
    /// Meesho.
    Meesho,
}

impl Platform {
    /// Broad channel categories. Any other platform filter value is a brand
    /// name searched for in report descriptions.
    pub const CATEGORIES: [Platform; 5] = [
        Self::Email,
        Self::Website,
        Self::SocialMedia,
        Self::PhoneCall,
        Self::TextMessage,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Email => "Email",
            Self::Website => "Website",
            Self::SocialMedia => "Social Media",
            Self::PhoneCall => "Phone Call",
            Self::TextMessage => "Text Message",
            Self::Instagram => "Instagram",
            Self::Facebook => "Facebook",
            Self::Flipkart => "Flipkart",
            Self::Blinkit => "Blinkit",
            Self::Zepto => "Zepto",
            Self::LinkedIn => "LinkedIn",
            Self::FreelancingWebsite => "Freelancing Website",
            Self::Amazon => "Amazon",
            Self::Meesho => "Meesho",
        }
    }
}

/// Severity chosen by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportedSeverity {
    /// Annoyance only.
    #[serde(rename = "Low - Annoyance")]
    Low,
    /// Moderate risk.
    #[serde(rename = "Medium - Moderate risk")]
    Medium,
    /// Immediate danger.
    #[serde(rename = "High - Immediate danger")]
    High,
    /// Money was lost.
    #[serde(rename = "Critical - Financial loss occurred")]
    Critical,
}

/// A community scam report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scam {
    /// Record id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Full account.
    pub description: String,
    /// Country where it happened.
    pub country: String,
    /// Category.
    #[serde(rename = "type")]
    pub scam_type: ScamType,
    /// Channel.
    pub platform: Platform,
    /// Card image id.
    pub image_id: String,
    /// Reporting user.
    pub author_id: String,
    /// Report time, Unix epoch milliseconds.
    pub created_at_ms: u64,
    /// Reported loss, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_loss: Option<f64>,
    /// Reporter-chosen severity.
    pub severity: ReportedSeverity,
    /// Red flags the reporter noticed.
    #[serde(default)]
    pub warning_signs: Vec<String>,
    /// Whether the report is featured as trending.
    #[serde(default)]
    pub is_trending: bool,
    /// Checker result attached at report time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_assessment: Option<RiskAnalysisResult>,
}

/// Fields supplied when reporting a scam.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScam {
    /// Headline.
    pub title: String,
    /// Full account.
    pub description: String,
    /// Country where it happened.
    pub country: String,
    /// Category.
    pub scam_type: ScamType,
    /// Channel.
    pub platform: Platform,
    /// Reporting user.
    pub author_id: String,
    /// Reported loss, if any.
    pub financial_loss: Option<f64>,
    /// Reporter-chosen severity.
    pub severity: ReportedSeverity,
    /// Red flags.
    pub warning_signs: Vec<String>,
    /// Trending flag.
    pub is_trending: bool,
    /// Optional checker result.
    pub risk_assessment: Option<RiskAnalysisResult>,
}

impl NewScam {
    /// Checks the report form bounds.
    ///
    /// # Errors
    /// Returns the first [`ReportError`] in field order: title, description,
    /// then warning signs.
    pub fn validate(&self) -> Result<(), ReportError> {
        let title = utf16_len(&self.title);
        if title < MIN_TITLE_CHARS {
            return Err(ReportError::TitleTooShort);
        }
        if title > MAX_TITLE_CHARS {
            return Err(ReportError::TitleTooLong);
        }

        let description = utf16_len(&self.description);
        if description < MIN_DESCRIPTION_CHARS {
            return Err(ReportError::DescriptionTooShort);
        }
        if description > MAX_DESCRIPTION_CHARS {
            return Err(ReportError::DescriptionTooLong);
        }

        if self.warning_signs.iter().any(|sign| sign.is_empty()) {
            return Err(ReportError::EmptyWarningSign);
        }
        Ok(())
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Record id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// SHA-256 hex digest of the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_digest: Option<String>,
}

/// Fields supplied when registering a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// SHA-256 hex digest of the password.
    pub password_digest: Option<String>,
}

/// Editable profile fields. Both replace the stored values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// Display name.
    pub name: String,
    /// Profile picture URL; `None` clears it.
    pub avatar_url: Option<String>,
}

/// A comment on a scam report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Record id.
    pub id: String,
    /// Commented scam.
    pub scam_id: String,
    /// Commenting user.
    pub author_id: String,
    /// Comment body.
    pub content: String,
    /// Comment time, Unix epoch milliseconds.
    pub created_at_ms: u64,
}

/// Filters for [`ScamStore::trending_scams`].
///
/// Each string filter matches case-insensitively; `"all"` disables it.
/// Country and type compare against the whole value. A platform filter naming
/// one of [`Platform::CATEGORIES`] compares against the platform label; any
/// other platform filter is searched for in the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingFilter {
    /// Country name.
    pub country: String,
    /// Scam type label.
    pub scam_type: String,
    /// Platform category label, or a brand name.
    pub platform: String,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl Default for TrendingFilter {
    fn default() -> Self {
        Self {
            country: FILTER_ALL.to_string(),
            scam_type: FILTER_ALL.to_string(),
            platform: FILTER_ALL.to_string(),
            limit: None,
        }
    }
}

impl TrendingFilter {
    /// Returns `true` when `scam` passes all three field filters.
    pub fn matches(&self, scam: &Scam) -> bool {
        filter_matches(&self.country, &scam.country)
            && filter_matches(&self.scam_type, scam.scam_type.label())
            && self.platform_matches(scam)
    }

    fn platform_matches(&self, scam: &Scam) -> bool {
        let platform = self.platform.as_str();
        if platform.eq_ignore_ascii_case(FILTER_ALL) {
            return true;
        }

        let is_category = Platform::CATEGORIES
            .iter()
            .any(|category| category.label().eq_ignore_ascii_case(platform));
        if is_category {
            filter_matches(platform, scam.platform.label())
        } else {
            scam.description
                .to_lowercase()
                .contains(&platform.to_lowercase())
        }
    }
}

fn filter_matches(filter: &str, value: &str) -> bool {
    filter.eq_ignore_ascii_case(FILTER_ALL) || filter.to_lowercase() == value.to_lowercase()
}

/// Sorts records newest first, keeping insertion order for equal timestamps.
pub fn sort_newest_first<T>(records: &mut [T], created_at_ms: impl Fn(&T) -> u64) {
    records.sort_by(|a, b| created_at_ms(b).cmp(&created_at_ms(a)));
}

/// Repository interface over scams, users and comments.
pub trait ScamStore: Send + Sync {
    /// Trending scams matching `filter`, newest first.
    fn trending_scams(&self, filter: &TrendingFilter) -> Result<Vec<Scam>, StoreError>;
    /// The `limit` most recent scams.
    fn recent_scams(&self, limit: usize) -> Result<Vec<Scam>, StoreError>;
    /// All scams, newest first.
    fn all_scams(&self) -> Result<Vec<Scam>, StoreError>;
    /// One scam by id.
    fn scam_by_id(&self, id: &str) -> Result<Option<Scam>, StoreError>;
    /// Stores a new report and returns it.
    fn add_scam(&self, scam: NewScam, now_ms: u64) -> Result<Scam, StoreError>;
    /// Deletes a scam and its comments. Returns `false` when absent.
    fn delete_scam(&self, id: &str) -> Result<bool, StoreError>;
    /// All users in registration order.
    fn all_users(&self) -> Result<Vec<User>, StoreError>;
    /// One user by id.
    fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;
    /// One user by exact email.
    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    /// Registers a user and returns it.
    fn add_user(&self, user: NewUser) -> Result<User, StoreError>;
    /// Replaces a user's profile fields and returns the updated user.
    fn update_user(&self, id: &str, update: ProfileUpdate) -> Result<User, StoreError>;
    /// Comments on one scam, newest first.
    fn comments_by_scam_id(&self, scam_id: &str) -> Result<Vec<Comment>, StoreError>;
    /// Adds a comment to an existing scam.
    fn add_comment(
        &self,
        scam_id: &str,
        author_id: &str,
        content: &str,
        now_ms: u64,
    ) -> Result<Comment, StoreError>;
    /// Deletes one comment. Returns `false` when absent.
    fn delete_comment(&self, id: &str) -> Result<bool, StoreError>;
}

/// Initial store contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    /// Scam reports.
    #[serde(default)]
    pub scams: Vec<Scam>,
    /// Users.
    #[serde(default)]
    pub users: Vec<User>,
    /// Comments.
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Lock-guarded in-memory [`ScamStore`].
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<SeedData>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_seed(SeedData::default())
    }

    /// Creates a store holding `seed`.
    pub fn with_seed(seed: SeedData) -> Self {
        Self {
            tables: RwLock::new(seed),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates a store from a JSON document with `scams`, `users` and
    /// `comments` arrays.
    ///
    /// # Errors
    /// Returns [`StoreError::Seed`] for malformed JSON.
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        let seed: SeedData = serde_json::from_str(raw).map_err(StoreError::Seed)?;
        Ok(Self::with_seed(seed))
    }

    /// Returns a snapshot of every table.
    ///
    /// # Errors
    /// Returns [`StoreError::Poisoned`] after a writer panicked.
    pub fn snapshot(&self) -> Result<SeedData, StoreError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, SeedData>, StoreError> {
        self.tables.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, SeedData>, StoreError> {
        self.tables.write().map_err(|_| StoreError::Poisoned)
    }

    fn allocate_id(&self, prefix: &str, taken: impl Fn(&str) -> bool) -> (u64, String) {
        loop {
            let sequence = self.next_id.fetch_add(1, Ordering::Relaxed);
            let id = format!("{prefix}-{sequence}");
            if !taken(&id) {
                return (sequence, id);
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScamStore for MemoryStore {
    fn trending_scams(&self, filter: &TrendingFilter) -> Result<Vec<Scam>, StoreError> {
        let mut scams: Vec<Scam> = self
            .read()?
            .scams
            .iter()
            .filter(|scam| scam.is_trending && filter.matches(scam))
            .cloned()
            .collect();
        sort_newest_first(&mut scams, |scam| scam.created_at_ms);

        // Zero behaves like no limit.
        if let Some(limit) = filter.limit.filter(|limit| *limit > 0) {
            scams.truncate(limit);
        }
        Ok(scams)
    }

    fn recent_scams(&self, limit: usize) -> Result<Vec<Scam>, StoreError> {
        let mut scams = self.all_scams()?;
        scams.truncate(limit);
        Ok(scams)
    }

    fn all_scams(&self) -> Result<Vec<Scam>, StoreError> {
        let mut scams = self.read()?.scams.clone();
        sort_newest_first(&mut scams, |scam| scam.created_at_ms);
        Ok(scams)
    }

    fn scam_by_id(&self, id: &str) -> Result<Option<Scam>, StoreError> {
        Ok(self.read()?.scams.iter().find(|scam| scam.id == id).cloned())
    }

    fn add_scam(&self, scam: NewScam, now_ms: u64) -> Result<Scam, StoreError> {
        let mut tables = self.write()?;
        let (sequence, id) =
            self.allocate_id("scam", |candidate| tables.scams.iter().any(|s| s.id == candidate));

        let record = Scam {
            id,
            title: scam.title,
            description: scam.description,
            country: scam.country,
            scam_type: scam.scam_type,
            platform: scam.platform,
            image_id: format!("carousel-{}", sequence % CAROUSEL_IMAGE_COUNT + 1),
            author_id: scam.author_id,
            created_at_ms: now_ms,
            financial_loss: scam.financial_loss,
            severity: scam.severity,
            warning_signs: scam.warning_signs,
            is_trending: scam.is_trending,
            risk_assessment: scam.risk_assessment,
        };
        tables.scams.insert(0, record.clone());
        tracing::info!(scam_id = %record.id, "scam reported");
        Ok(record)
    }

    fn delete_scam(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let Some(position) = tables.scams.iter().position(|scam| scam.id == id) else {
            return Ok(false);
        };

        tables.scams.remove(position);
        let before = tables.comments.len();
        tables.comments.retain(|comment| comment.scam_id != id);
        tracing::info!(
            scam_id = id,
            removed_comments = before - tables.comments.len(),
            "scam deleted"
        );
        Ok(true)
    }

    fn all_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.read()?.users.clone())
    }

    fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.iter().find(|user| user.id == id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .read()?
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn add_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        let (_, id) =
            self.allocate_id("user", |candidate| tables.users.iter().any(|u| u.id == candidate));

        let record = User {
            avatar_url: Some(format!("{AVATAR_BASE_URL}{id}")),
            id,
            name: user.name,
            email: user.email,
            password_digest: user.password_digest,
        };
        tables.users.push(record.clone());
        tracing::info!(user_id = %record.id, "user created");
        Ok(record)
    }

    fn update_user(&self, id: &str, update: ProfileUpdate) -> Result<User, StoreError> {
        let mut tables = self.write()?;
        let Some(user) = tables.users.iter_mut().find(|user| user.id == id) else {
            return Err(StoreError::NotFound(format!("user {id}")));
        };

        user.name = update.name;
        user.avatar_url = update.avatar_url;
        tracing::info!(user_id = id, "profile updated");
        Ok(user.clone())
    }

    fn comments_by_scam_id(&self, scam_id: &str) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .read()?
            .comments
            .iter()
            .filter(|comment| comment.scam_id == scam_id)
            .cloned()
            .collect();
        sort_newest_first(&mut comments, |comment| comment.created_at_ms);
        Ok(comments)
    }

    fn add_comment(
        &self,
        scam_id: &str,
        author_id: &str,
        content: &str,
        now_ms: u64,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.write()?;
        if !tables.scams.iter().any(|scam| scam.id == scam_id) {
            return Err(StoreError::NotFound(format!("scam {scam_id}")));
        }

        let (_, id) = self.allocate_id("comment", |candidate| {
            tables.comments.iter().any(|c| c.id == candidate)
        });
        let record = Comment {
            id,
            scam_id: scam_id.to_string(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at_ms: now_ms,
        };
        tables.comments.insert(0, record.clone());
        tracing::info!(comment_id = %record.id, scam_id, "comment added");
        Ok(record)
    }

    fn delete_comment(&self, id: &str) -> Result<bool, StoreError> {
        let mut tables = self.write()?;
        let Some(position) = tables.comments.iter().position(|comment| comment.id == id) else {
            return Ok(false);
        };
        tables.comments.remove(position);
        tracing::info!(comment_id = id, "comment deleted");
        Ok(true)
    }
}

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),
    /// A writer panicked while holding the lock.
    #[error("store lock poisoned")]
    Poisoned,
    /// Seed document could not be decoded.
    #[error("invalid seed data: {0}")]
    Seed(#[source] serde_json::Error),
}

/// Report form violations. Each message is shown next to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Title below the minimum.
    #[error("Title must be at least 10 characters.")]
    TitleTooShort,
    /// Title above the maximum.
    #[error("Title cannot be longer than 100 characters.")]
    TitleTooLong,
    /// Description below the minimum.
    #[error("Description must be at least 50 characters.")]
    DescriptionTooShort,
    /// Description above the maximum.
    #[error("Description cannot be longer than 2000 characters.")]
    DescriptionTooLong,
    /// A warning sign entry is blank.
    #[error("Warning sign cannot be empty.")]
    EmptyWarningSign,
}
