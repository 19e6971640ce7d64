//! Locale codes and the locale-prefix rules for site paths.
//!
//! Every public path carries its locale as the first segment
//! (`/<locale>/...`). [`LocaleSet::resolve`] splits that segment off;
//! [`LocaleSet::localize`] and [`LocaleSet::switch_locale`] put one back.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// An opaque locale code such as `en` or `sl`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Validate and normalise a locale code to lowercase.
    pub fn parse(code: &str) -> Result<Self, DomainError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(DomainError::validation("locale", "code must not be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(DomainError::validation(
                "locale",
                format!("`{code}` may only contain ASCII letters, digits and `-`"),
            ));
        }
        Ok(Self(code.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of splitting the locale segment off a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocale<'a> {
    pub locale: &'a Locale,
    /// Path without the locale segment. Always starts with `/` when the path
    /// was prefixed; otherwise the original path.
    pub remainder: String,
    /// Whether the first segment named a configured locale.
    pub prefixed: bool,
}

/// The configured, ordered, non-empty set of locales with one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleSet {
    locales: Vec<Locale>,
    default: usize,
}

impl LocaleSet {
    pub fn new<I, S>(codes: I, default: &str) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locales: Vec<Locale> = Vec::new();
        for code in codes {
            let locale = Locale::parse(code.as_ref())?;
            if locales.contains(&locale) {
                return Err(DomainError::validation(
                    "locales",
                    format!("`{locale}` is listed more than once"),
                ));
            }
            locales.push(locale);
        }

        if locales.is_empty() {
            return Err(DomainError::validation(
                "locales",
                "at least one locale must be configured",
            ));
        }

        let default_locale = Locale::parse(default)?;
        let default = locales
            .iter()
            .position(|locale| *locale == default_locale)
            .ok_or_else(|| {
                DomainError::validation(
                    "default_locale",
                    format!("`{default_locale}` is not one of the configured locales"),
                )
            })?;

        Ok(Self { locales, default })
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn default_locale(&self) -> &Locale {
        &self.locales[self.default]
    }

    /// Look up a configured locale by its exact code.
    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.locales.iter().find(|locale| locale.as_str() == code)
    }

    /// The configured locale for `code`, or the default one when the code is
    /// missing or not configured.
    pub fn get_or_default(&self, code: Option<&str>) -> &Locale {
        code.and_then(|code| self.get(code))
            .unwrap_or_else(|| self.default_locale())
    }

    /// Split the locale segment off `path`.
    ///
    /// Unknown first segments are not locale segments: the default locale is
    /// returned with the path untouched. No redirect is decided here.
    pub fn resolve<'a>(&'a self, path: &str) -> ResolvedLocale<'a> {
        let body = path.strip_prefix('/').unwrap_or(path);
        let split = body.find(['/', '?', '#']).unwrap_or(body.len());
        let (first, rest) = body.split_at(split);

        match self.get(first) {
            Some(locale) => ResolvedLocale {
                locale,
                remainder: if rest.starts_with('/') {
                    rest.to_string()
                } else {
                    format!("/{rest}")
                },
                prefixed: true,
            },
            None => ResolvedLocale {
                locale: self.default_locale(),
                remainder: path.to_string(),
                prefixed: false,
            },
        }
    }

    /// Rewrite `path` so it points at the same page in `target`.
    pub fn switch_locale(&self, path: &str, target: &Locale) -> String {
        let resolved = self.resolve(path);
        join_locale(target, &resolved.remainder)
    }

    /// Apply the locale prefix to a site-relative href.
    ///
    /// Absolute and protocol-relative URLs, fragments, query-only and
    /// relative hrefs, and paths that already carry a locale pass through.
    pub fn localize(&self, href: &str, locale: &Locale) -> String {
        if !href.starts_with('/') || href.starts_with("//") {
            return href.to_string();
        }
        if self.resolve(href).prefixed {
            return href.to_string();
        }
        join_locale(locale, href)
    }
}

fn join_locale(locale: &Locale, remainder: &str) -> String {
    let remainder = remainder.trim_start_matches('/');
    if remainder.is_empty() {
        format!("/{locale}")
    } else if remainder.starts_with(['?', '#']) {
        format!("/{locale}{remainder}")
    } else {
        format!("/{locale}/{remainder}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locales() -> LocaleSet {
        LocaleSet::new(["sl", "en"], "sl").expect("valid locales")
    }

    #[test]
    fn rejects_empty_duplicate_and_unknown_default() {
        assert!(LocaleSet::new(Vec::<String>::new(), "en").is_err());
        assert!(LocaleSet::new(["en", "EN"], "en").is_err());
        assert!(LocaleSet::new(["en", "sl"], "de").is_err());
        assert!(LocaleSet::new(["en us"], "en us").is_err());
    }

    #[test]
    fn default_is_the_configured_one() {
        let set = locales();
        assert_eq!(set.default_locale().as_str(), "sl");
        assert_eq!(set.locales().len(), 2);
    }

    #[test]
    fn resolve_strips_known_prefix() {
        let set = locales();

        let resolved = set.resolve("/en/about");
        assert_eq!(resolved.locale.as_str(), "en");
        assert_eq!(resolved.remainder, "/about");
        assert!(resolved.prefixed);

        let resolved = set.resolve("/en");
        assert_eq!(resolved.locale.as_str(), "en");
        assert_eq!(resolved.remainder, "/");

        let resolved = set.resolve("/en/posts/page/2");
        assert_eq!(resolved.remainder, "/posts/page/2");
    }

    #[test]
    fn resolve_falls_back_to_default_without_touching_path() {
        let set = locales();

        let resolved = set.resolve("/fr/about");
        assert_eq!(resolved.locale.as_str(), "sl");
        assert_eq!(resolved.remainder, "/fr/about");
        assert!(!resolved.prefixed);

        let resolved = set.resolve("/");
        assert_eq!(resolved.locale.as_str(), "sl");
        assert_eq!(resolved.remainder, "/");
        assert!(!resolved.prefixed);
    }

    #[test]
    fn resolve_does_not_treat_longer_segment_as_locale() {
        let set = locales();
        let resolved = set.resolve("/english/about");
        assert!(!resolved.prefixed);
    }

    #[test]
    fn resolve_handles_query_after_locale() {
        let set = locales();
        let resolved = set.resolve("/en?ref=nav");
        assert!(resolved.prefixed);
        assert_eq!(resolved.remainder, "/?ref=nav");
    }

    #[test]
    fn switch_locale_replaces_or_prefixes() {
        let set = locales();
        let en = set.get("en").expect("en configured").clone();

        assert_eq!(set.switch_locale("/sl/posts/hello", &en), "/en/posts/hello");
        assert_eq!(set.switch_locale("/sl", &en), "/en");
        assert_eq!(set.switch_locale("/posts", &en), "/en/posts");
    }

    #[test]
    fn localize_prefixes_site_relative_paths_only() {
        let set = locales();
        let en = set.get("en").expect("en configured").clone();

        assert_eq!(set.localize("/posts/hello", &en), "/en/posts/hello");
        assert_eq!(set.localize("/", &en), "/en");
        assert_eq!(set.localize("/sl/posts", &en), "/sl/posts");
        assert_eq!(set.localize("https://example.com/a", &en), "https://example.com/a");
        assert_eq!(set.localize("//cdn.example.com/a", &en), "//cdn.example.com/a");
        assert_eq!(set.localize("#contact", &en), "#contact");
        assert_eq!(set.localize("mailto:hi@example.com", &en), "mailto:hi@example.com");
    }

    #[test]
    fn get_or_default_falls_back() {
        let set = locales();
        assert_eq!(set.get_or_default(Some("en")).as_str(), "en");
        assert_eq!(set.get_or_default(Some("fr")).as_str(), "sl");
        assert_eq!(set.get_or_default(None).as_str(), "sl");
    }
}
