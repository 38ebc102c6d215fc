use std::fmt;
use std::sync::Arc;

use cookie::SameSite;
use time::Duration;

use crate::error::{Error, Result};
use crate::session::Session;

/// Longest lifetime a config accepts. Browsers cap cookie expiry at 400 days.
pub const MAX_LIFETIME: Duration = Duration::days(400);

/// Decides whether a non-empty session is written back and its cookie
/// (re)issued at the end of a request.
#[derive(Clone, Default)]
pub enum CookiePolicy {
    /// Write on every request that ends with a non-empty session.
    Always,
    /// Write only when the contents were changed.
    OnModified,
    /// Write when the contents were changed, or when the session is permanent
    /// so its expiry slides forward on every request.
    #[default]
    OnModifiedOrPermanent,
    /// Caller-supplied predicate.
    Custom(Arc<dyn Fn(&Session) -> bool + Send + Sync>),
}

impl CookiePolicy {
    pub fn custom(predicate: impl Fn(&Session) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(predicate))
    }

    pub fn should_set_cookie(&self, session: &Session) -> bool {
        match self {
            Self::Always => true,
            Self::OnModified => session.is_modified(),
            Self::OnModifiedOrPermanent => session.is_modified() || session.is_permanent(),
            Self::Custom(predicate) => predicate(session),
        }
    }

    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "on_modified" | "modified" => Ok(Self::OnModified),
            "on_modified_or_permanent" | "refresh" => Ok(Self::OnModifiedOrPermanent),
            other => Err(Error::Config(format!(
                "SESSION_COOKIE_POLICY: unknown policy `{other}`"
            ))),
        }
    }
}

impl fmt::Debug for CookiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::OnModified => f.write_str("OnModified"),
            Self::OnModifiedOrPermanent => f.write_str("OnModifiedOrPermanent"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Cookie and lifetime settings for a [`SessionInterface`](crate::SessionInterface).
///
/// Use [`SessionConfig::default()`] with the `with_*` methods, or
/// [`SessionConfig::from_env()`] for convention-based setup.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub(crate) cookie_name: String,
    pub(crate) cookie_domain: Option<String>,
    pub(crate) cookie_path: String,
    pub(crate) cookie_http_only: bool,
    pub(crate) cookie_secure: bool,
    pub(crate) cookie_same_site: SameSite,
    pub(crate) lifetime: Duration,
    pub(crate) permanent: bool,
    pub(crate) cookie_policy: CookiePolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session".into(),
            cookie_domain: None,
            cookie_path: "/".into(),
            cookie_http_only: true,
            cookie_secure: false,
            cookie_same_site: SameSite::Strict,
            lifetime: Duration::days(31),
            permanent: false,
            cookie_policy: CookiePolicy::default(),
        }
    }
}

impl SessionConfig {
    /// Builds a config from environment variables, falling back to the
    /// defaults for anything unset.
    ///
    /// # Optional env vars
    /// - `SESSION_COOKIE_NAME`
    /// - `SESSION_COOKIE_DOMAIN`
    /// - `SESSION_COOKIE_PATH`
    /// - `SESSION_COOKIE_HTTPONLY`: `true`/`false`/`1`/`0`
    /// - `SESSION_COOKIE_SECURE`: `true`/`false`/`1`/`0`
    /// - `SESSION_COOKIE_SAMESITE`: `Strict`, `Lax` or `None`
    /// - `SESSION_LIFETIME_SECONDS`: positive integer, at most 400 days
    /// - `SESSION_PERMANENT`: `true`/`false`/`1`/`0`
    /// - `SESSION_COOKIE_POLICY`: `always`, `on_modified` or `on_modified_or_permanent`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(name) = lookup("SESSION_COOKIE_NAME") {
            if name.trim().is_empty() {
                return Err(Error::Config("SESSION_COOKIE_NAME must not be empty".into()));
            }
            config = config.with_cookie_name(name);
        }
        if let Some(domain) = lookup("SESSION_COOKIE_DOMAIN") {
            config = config.with_cookie_domain(domain);
        }
        if let Some(path) = lookup("SESSION_COOKIE_PATH") {
            config = config.with_cookie_path(path);
        }
        if let Some(value) = lookup("SESSION_COOKIE_HTTPONLY") {
            config = config.with_http_only(parse_bool("SESSION_COOKIE_HTTPONLY", &value)?);
        }
        if let Some(value) = lookup("SESSION_COOKIE_SECURE") {
            config = config.with_secure(parse_bool("SESSION_COOKIE_SECURE", &value)?);
        }
        if let Some(value) = lookup("SESSION_COOKIE_SAMESITE") {
            config = config.with_same_site(parse_same_site(&value)?);
        }
        if let Some(value) = lookup("SESSION_LIFETIME_SECONDS") {
            let seconds: i64 = value
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("SESSION_LIFETIME_SECONDS: {e}")))?;
            if seconds <= 0 {
                return Err(Error::Config(
                    "SESSION_LIFETIME_SECONDS must be positive".into(),
                ));
            }
            if seconds > MAX_LIFETIME.whole_seconds() {
                return Err(Error::Config(format!(
                    "SESSION_LIFETIME_SECONDS must be at most {}",
                    MAX_LIFETIME.whole_seconds()
                )));
            }
            config = config.with_lifetime(Duration::seconds(seconds));
        }
        if let Some(value) = lookup("SESSION_PERMANENT") {
            config = config.with_permanent(parse_bool("SESSION_PERMANENT", &value)?);
        }
        if let Some(value) = lookup("SESSION_COOKIE_POLICY") {
            config = config.with_cookie_policy(CookiePolicy::parse(&value)?);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    #[must_use]
    pub fn with_cookie_domain(mut self, domain: impl Into<String>) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_cookie_path(mut self, path: impl Into<String>) -> Self {
        self.cookie_path = path.into();
        self
    }

    #[must_use]
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// How long a saved session stays valid. Also the cookie lifetime for
    /// permanent sessions.
    ///
    /// Values above [`MAX_LIFETIME`] are clamped to it.
    #[must_use]
    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime.min(MAX_LIFETIME);
        self
    }

    /// Whether newly opened sessions start out permanent.
    #[must_use]
    pub fn with_permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    #[must_use]
    pub fn with_cookie_policy(mut self, policy: CookiePolicy) -> Self {
        self.cookie_policy = policy;
        self
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    pub fn cookie_path(&self) -> &str {
        &self.cookie_path
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("{key}: expected a boolean, got `{other}`"))),
    }
}

fn parse_same_site(value: &str) -> Result<SameSite> {
    match value.trim().to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" => Ok(SameSite::None),
        other => Err(Error::Config(format!(
            "SESSION_COOKIE_SAMESITE: expected Strict, Lax or None, got `{other}`"
        ))),
    }
}
