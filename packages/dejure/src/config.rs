//! Configuration constants, display options and the immutable
//! [`AnnotationConfig`] used by every annotation request.
//!
//! Enum-valued options are validated when they are assigned: parsing an
//! unknown token fails with [`ConfigError::InvalidOption`] immediately, so a
//! request can never carry an unsupported option.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Base URL of the dejure.org linking service.
pub const DEJURE_BASE_URL: &str = "https://rechtsnetz.dejure.org";

/// Path of the linking endpoint below [`DEJURE_BASE_URL`].
pub const VERNETZEN_PATH: &str = "/dienste/vernetzung/vernetzen";

/// Version tag sent along with every request.
pub const CLIENT_VERSION: &str = concat!("regelrecht-dejure@", env!("CARGO_PKG_VERSION"));

/// Default timeout for establishing the request, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 3;

/// Default timeout for reading the response body, in seconds.
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 10;

/// Default lifetime of cached results, in days.
pub const DEFAULT_CACHE_DURATION_DAYS: u64 = 2;

/// Convert a day count into the seconds expected by cache stores.
///
/// Saturates at `u64::MAX`, which stores treat as no expiry.
///
/// # Examples
/// ```
/// use regelrecht_dejure::config::days_to_seconds;
///
/// assert_eq!(days_to_seconds(2), 172_800);
/// ```
pub fn days_to_seconds(days: u64) -> u64 {
    days.saturating_mul(24 * 60 * 60)
}

/// Range of the `a` element around a citation.
///
/// `Wide`: `<a href="">§ 185 StGB</a>`, `Narrow`: `§ <a href="">185</a> StGB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    #[default]
    Wide,
    Narrow,
}

impl LinkStyle {
    /// Accepted wire tokens.
    pub const ALLOWED: &'static [&'static str] = &["weit", "schmal"];

    /// Token sent as the `format` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wide => "weit",
            Self::Narrow => "schmal",
        }
    }
}

impl FromStr for LinkStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "weit" | "wide" => Ok(Self::Wide),
            "schmal" | "narrow" => Ok(Self::Narrow),
            _ => Err(ConfigError::InvalidOption {
                option: "format",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Granularity of the `title` attribute on inserted links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tooltip {
    None,
    Neutral,
    #[default]
    Descriptive,
    Statute,
    Half,
}

impl Tooltip {
    /// Accepted wire tokens.
    pub const ALLOWED: &'static [&'static str] =
        &["ohne", "neutral", "beschreibend", "Gesetze", "halb"];

    /// Token sent as the `Tooltip` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "ohne",
            Self::Neutral => "neutral",
            Self::Descriptive => "beschreibend",
            Self::Statute => "Gesetze",
            Self::Half => "halb",
        }
    }
}

impl FromStr for Tooltip {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ohne" | "none" => Ok(Self::None),
            "neutral" => Ok(Self::Neutral),
            "beschreibend" | "descriptive" => Ok(Self::Descriptive),
            "Gesetze" | "statute" => Ok(Self::Statute),
            "halb" | "half" => Ok(Self::Half),
            _ => Err(ConfigError::InvalidOption {
                option: "Tooltip",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

/// Whether citations spanning a line break are linked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineBreak {
    None,
    Keep,
    #[default]
    Auto,
}

impl LineBreak {
    /// Accepted wire tokens.
    pub const ALLOWED: &'static [&'static str] = &["ohne", "mit", "auto"];

    /// Token sent as the `Zeilenwechsel` query parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "ohne",
            Self::Keep => "mit",
            Self::Auto => "auto",
        }
    }
}

impl FromStr for LineBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ohne" | "none" => Ok(Self::None),
            "mit" | "keep" => Ok(Self::Keep),
            "auto" => Ok(Self::Auto),
            _ => Err(ConfigError::InvalidOption {
                option: "Zeilenwechsel",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

macro_rules! impl_display_token {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display_token!(LinkStyle, Tooltip, LineBreak);

/// Immutable set of display and connection options.
///
/// Built once through [`AnnotationConfig::builder`] or
/// [`AnnotationConfig::from_env`]; there are no setters afterwards.
///
/// Changing display options does not invalidate results that are already
/// cached, so clear the cache when switching them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationConfig {
    pub domain: String,
    pub contact: String,
    pub link_style: LinkStyle,
    pub tooltip: Tooltip,
    pub line_break: LineBreak,
    pub css_class: String,
    pub link_target: String,
    /// Link to buzer.de when a norm is not available on dejure.org.
    pub allow_fallback_provider: bool,
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
    pub user_agent: Option<String>,
    pub cache_duration_days: u64,
    pub base_url: String,
}

impl AnnotationConfig {
    /// Start a builder for the given provider domain.
    ///
    /// The contact address defaults to `webmaster@<domain>`.
    pub fn builder(domain: impl Into<String>) -> AnnotationConfigBuilder {
        let domain = domain.into();
        AnnotationConfigBuilder {
            contact: format!("webmaster@{domain}"),
            domain,
            link_style: LinkStyle::default(),
            tooltip: Tooltip::default(),
            line_break: LineBreak::default(),
            css_class: String::new(),
            link_target: String::new(),
            allow_fallback_provider: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            stream_timeout: Duration::from_secs(DEFAULT_STREAM_TIMEOUT_SECS),
            user_agent: None,
            cache_duration_days: DEFAULT_CACHE_DURATION_DAYS,
            base_url: DEJURE_BASE_URL.to_string(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// `DEJURE_DOMAIN` is required. Enum options that are set but not
    /// recognized are rejected here, before any text is processed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let domain = lookup("DEJURE_DOMAIN")
            .filter(|d| !d.is_empty())
            .ok_or(ConfigError::Missing("DEJURE_DOMAIN"))?;

        let mut builder = Self::builder(domain);

        if let Some(contact) = lookup("DEJURE_CONTACT") {
            builder = builder.contact(contact);
        }
        if let Some(v) = lookup("DEJURE_LINK_STYLE") {
            builder = builder.link_style(v.parse()?);
        }
        if let Some(v) = lookup("DEJURE_TOOLTIP") {
            builder = builder.tooltip(v.parse()?);
        }
        if let Some(v) = lookup("DEJURE_LINE_BREAK") {
            builder = builder.line_break(v.parse()?);
        }
        if let Some(v) = lookup("DEJURE_CLASS") {
            builder = builder.css_class(v);
        }
        if let Some(v) = lookup("DEJURE_TARGET") {
            builder = builder.link_target(v);
        }
        if let Some(v) = lookup("DEJURE_BUZER") {
            builder = builder.allow_fallback_provider(v != "false" && v != "0");
        }
        if let Some(v) = lookup("DEJURE_TIMEOUT_SECS") {
            builder = builder.request_timeout(Duration::from_secs(parse_number(
                "DEJURE_TIMEOUT_SECS",
                &v,
            )?));
        }
        if let Some(v) = lookup("DEJURE_STREAM_TIMEOUT_SECS") {
            builder = builder.stream_timeout(Duration::from_secs(parse_number(
                "DEJURE_STREAM_TIMEOUT_SECS",
                &v,
            )?));
        }
        if let Some(v) = lookup("DEJURE_USER_AGENT") {
            builder = builder.user_agent(v);
        }
        if let Some(v) = lookup("DEJURE_CACHE_DAYS") {
            builder = builder.cache_duration_days(parse_number("DEJURE_CACHE_DAYS", &v)?);
        }
        if let Some(v) = lookup("DEJURE_BASE_URL") {
            builder = builder.base_url(v);
        }

        Ok(builder.build())
    }

    /// Provider identity sent as `Anbieterkennung`.
    #[must_use]
    pub fn provider_id(&self) -> String {
        format!("{}-{}", self.domain, self.contact)
    }

    /// Configured user agent, or one derived from crate version and domain.
    #[must_use]
    pub fn effective_user_agent(&self) -> String {
        self.user_agent.clone().unwrap_or_else(|| {
            format!(
                "regelrecht-dejure v{} @ {}",
                env!("CARGO_PKG_VERSION"),
                self.domain
            )
        })
    }

    /// Lifetime of cached results in seconds.
    #[must_use]
    pub fn cache_ttl_seconds(&self) -> u64 {
        days_to_seconds(self.cache_duration_days)
    }
}

fn parse_number(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}

/// Builder for constructing an [`AnnotationConfig`].
#[derive(Debug, Clone)]
pub struct AnnotationConfigBuilder {
    domain: String,
    contact: String,
    link_style: LinkStyle,
    tooltip: Tooltip,
    line_break: LineBreak,
    css_class: String,
    link_target: String,
    allow_fallback_provider: bool,
    request_timeout: Duration,
    stream_timeout: Duration,
    user_agent: Option<String>,
    cache_duration_days: u64,
    base_url: String,
}

impl AnnotationConfigBuilder {
    pub fn contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    pub fn link_style(mut self, link_style: LinkStyle) -> Self {
        self.link_style = link_style;
        self
    }

    pub fn tooltip(mut self, tooltip: Tooltip) -> Self {
        self.tooltip = tooltip;
        self
    }

    pub fn line_break(mut self, line_break: LineBreak) -> Self {
        self.line_break = line_break;
        self
    }

    pub fn css_class(mut self, css_class: impl Into<String>) -> Self {
        self.css_class = css_class.into();
        self
    }

    pub fn link_target(mut self, link_target: impl Into<String>) -> Self {
        self.link_target = link_target.into();
        self
    }

    pub fn allow_fallback_provider(mut self, allow: bool) -> Self {
        self.allow_fallback_provider = allow;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn stream_timeout(mut self, timeout: Duration) -> Self {
        self.stream_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn cache_duration_days(mut self, days: u64) -> Self {
        self.cache_duration_days = days;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> AnnotationConfig {
        AnnotationConfig {
            domain: self.domain,
            contact: self.contact,
            link_style: self.link_style,
            tooltip: self.tooltip,
            line_break: self.line_break,
            css_class: self.css_class,
            link_target: self.link_target,
            allow_fallback_provider: self.allow_fallback_provider,
            request_timeout: self.request_timeout,
            stream_timeout: self.stream_timeout,
            user_agent: self.user_agent,
            cache_duration_days: self.cache_duration_days,
            base_url: self.base_url,
        }
    }
}
