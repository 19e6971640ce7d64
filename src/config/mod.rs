//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::cache::{CacheConfig, PathShapeSpec, PathShapeTable};
use crate::domain::locale::LocaleSet;

pub use cli::{
    CliArgs, Command, ContentOverride, PathsArgs, PlanArgs, ServeArgs, ServeOverrides,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vellum";
const ENV_PREFIX: &str = "VELLUM";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_LOCALES: [&str; 2] = ["sl", "en"];
const DEFAULT_LOCALE: &str = "sl";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:8080";
const DEFAULT_CONTENT_BASE_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_CONTENT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONTENT_DEPTH: u32 = 2;
const DEFAULT_API_KEY_COLLECTION: &str = "users";
const DEFAULT_PURGE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub site: SiteSettings,
    pub content: ContentSettings,
    pub cache: CacheConfig,
    pub hooks: HooksSettings,
    pub collections: PathShapeTable,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub locales: LocaleSet,
    /// Base for absolute URLs in sitemaps.
    pub public_url: Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBackend {
    Http {
        base_url: Url,
        api_key: Option<String>,
        /// Auth collection named in the `API-Key` authorization header.
        api_key_collection: String,
    },
    Memory {
        fixtures: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub backend: ContentBackend,
    pub timeout: Duration,
    /// Relationship expansion depth requested from the store.
    pub depth: u32,
}

#[derive(Debug, Clone)]
pub struct HooksSettings {
    /// Shared secret expected in the mutation hook header.
    pub secret: Option<String>,
    /// Downstream endpoints that receive every executed purge set.
    pub purge_webhooks: Vec<Url>,
    pub purge_secret: Option<String>,
    pub purge_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("site.locales")
            .with_list_parse_key("hooks.purge_webhooks")
            .try_parsing(true),
    );

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Paths(args)) => raw.apply_content_override(&args.content),
        Some(Command::Plan(_)) => {}
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    site: RawSiteSettings,
    content: RawContentSettings,
    cache: CacheConfig,
    hooks: RawHooksSettings,
    collections: Option<Vec<PathShapeSpec>>,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.site_public_url.as_ref() {
            self.site.public_url = Some(url.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = enabled;
        }

        self.apply_content_override(&overrides.content);
    }

    fn apply_content_override(&mut self, overrides: &ContentOverride) {
        if let Some(url) = overrides.content_base_url.as_ref() {
            self.content.backend = Some("http".to_string());
            self.content.base_url = Some(url.clone());
        }
        if let Some(path) = overrides.content_fixtures.as_ref() {
            self.content.backend = Some("memory".to_string());
            self.content.fixtures = Some(path.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            site,
            content,
            cache,
            hooks,
            collections,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let site = build_site_settings(site)?;
        let content = build_content_settings(content)?;
        let cache = validate_cache(cache)?;
        let hooks = build_hooks_settings(hooks)?;
        let collections = build_collections(collections, cache.default_lookahead)?;

        Ok(Self {
            server,
            logging,
            site,
            content,
            cache,
            hooks,
            collections,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let codes = site
        .locales
        .unwrap_or_else(|| DEFAULT_LOCALES.iter().map(|code| code.to_string()).collect());
    let default_locale = site
        .default_locale
        .unwrap_or_else(|| DEFAULT_LOCALE.to_string());
    let locales = LocaleSet::new(codes.iter().map(|code| code.trim()), default_locale.trim())
        .map_err(|err| LoadError::invalid("site.locales", err.to_string()))?;

    let public_url = parse_url(
        site.public_url.as_deref().unwrap_or(DEFAULT_PUBLIC_URL),
        "site.public_url",
    )?;

    Ok(SiteSettings {
        locales,
        public_url,
    })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let backend = match content.backend.as_deref().map(str::trim).unwrap_or("http") {
        "http" => ContentBackend::Http {
            base_url: parse_url(
                content
                    .base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_CONTENT_BASE_URL),
                "content.base_url",
            )?,
            api_key: content
                .api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            api_key_collection: content
                .api_key_collection
                .unwrap_or_else(|| DEFAULT_API_KEY_COLLECTION.to_string()),
        },
        "memory" => ContentBackend::Memory {
            fixtures: content
                .fixtures
                .filter(|path| !path.as_os_str().is_empty())
                .ok_or_else(|| {
                    LoadError::invalid("content.fixtures", "required for the memory backend")
                })?,
        },
        other => {
            return Err(LoadError::invalid(
                "content.backend",
                format!("`{other}` is not one of http, memory"),
            ));
        }
    };

    let timeout_secs = content
        .timeout_seconds
        .unwrap_or(DEFAULT_CONTENT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "content.timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ContentSettings {
        backend,
        timeout: Duration::from_secs(timeout_secs),
        depth: content.depth.unwrap_or(DEFAULT_CONTENT_DEPTH),
    })
}

fn validate_cache(cache: CacheConfig) -> Result<CacheConfig, LoadError> {
    if cache.response_limit == 0 {
        return Err(LoadError::invalid(
            "cache.response_limit",
            "must be greater than zero",
        ));
    }
    if cache.consume_batch_limit == 0 {
        return Err(LoadError::invalid(
            "cache.consume_batch_limit",
            "must be greater than zero",
        ));
    }
    if cache.max_age_seconds == 0 {
        return Err(LoadError::invalid(
            "cache.max_age_seconds",
            "must be greater than zero",
        ));
    }
    Ok(cache)
}

fn build_hooks_settings(hooks: RawHooksSettings) -> Result<HooksSettings, LoadError> {
    let purge_webhooks = hooks
        .purge_webhooks
        .unwrap_or_default()
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| parse_url(value, "hooks.purge_webhooks"))
        .collect::<Result<Vec<_>, _>>()?;

    let purge_timeout_secs = hooks
        .purge_timeout_seconds
        .unwrap_or(DEFAULT_PURGE_TIMEOUT_SECS);
    if purge_timeout_secs == 0 {
        return Err(LoadError::invalid(
            "hooks.purge_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(HooksSettings {
        secret: non_blank(hooks.secret),
        purge_webhooks,
        purge_secret: non_blank(hooks.purge_secret),
        purge_timeout: Duration::from_secs(purge_timeout_secs),
    })
}

fn build_collections(
    collections: Option<Vec<PathShapeSpec>>,
    default_lookahead: u32,
) -> Result<PathShapeTable, LoadError> {
    match collections {
        Some(specs) if !specs.is_empty() => PathShapeTable::from_specs(&specs, default_lookahead)
            .map_err(|err| LoadError::invalid("collections", err.to_string())),
        _ => Ok(PathShapeTable::standard(default_lookahead)),
    }
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse::<SocketAddr>()
        .map_err(|err| format!("`{candidate}` is not a valid socket address: {err}"))
}

fn parse_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    Url::parse(value.trim())
        .map_err(|err| LoadError::invalid(key, format!("`{value}` is not a valid URL: {err}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    locales: Option<Vec<String>>,
    default_locale: Option<String>,
    public_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    backend: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
    api_key_collection: Option<String>,
    fixtures: Option<PathBuf>,
    timeout_seconds: Option<u64>,
    depth: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHooksSettings {
    secret: Option<String>,
    purge_webhooks: Option<Vec<String>>,
    purge_secret: Option<String>,
    purge_timeout_seconds: Option<u64>,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::document::CollectionName;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");
        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.site.locales.default_locale().as_str(), "sl");
        assert_eq!(settings.site.locales.locales().len(), 2);
        assert_eq!(settings.cache.max_age(), Duration::from_secs(600));
        assert!(matches!(
            settings.content.backend,
            ContentBackend::Http { api_key: None, .. }
        ));
        assert!(
            settings
                .collections
                .get(&CollectionName::new("posts"))
                .is_some()
        );
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            cache_enabled: Some(false),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert!(!settings.cache.enabled);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn fixtures_override_switches_backend() {
        let mut raw = RawSettings::default();
        raw.apply_content_override(&ContentOverride {
            content_fixtures: Some(PathBuf::from("fixtures/site.json")),
            ..Default::default()
        });
        let settings = Settings::from_raw(raw).expect("valid settings");
        assert_eq!(
            settings.content.backend,
            ContentBackend::Memory {
                fixtures: PathBuf::from("fixtures/site.json")
            }
        );
    }

    #[test]
    fn memory_backend_requires_fixtures() {
        let mut raw = RawSettings::default();
        raw.content.backend = Some("memory".to_string());
        let err = Settings::from_raw(raw).expect_err("fixtures missing");
        assert!(matches!(
            err,
            LoadError::Invalid {
                key: "content.fixtures",
                ..
            }
        ));
    }

    #[test]
    fn default_locale_must_be_configured() {
        let mut raw = RawSettings::default();
        raw.site.locales = Some(vec!["en".to_string(), "de".to_string()]);
        raw.site.default_locale = Some("sl".to_string());
        let err = Settings::from_raw(raw).expect_err("unknown default locale");
        assert!(matches!(err, LoadError::Invalid { key: "site.locales", .. }));
    }

    #[test]
    fn invalid_collection_template_is_rejected() {
        let mut raw = RawSettings::default();
        raw.collections = Some(vec![PathShapeSpec {
            collection: "events".to_string(),
            detail: Some("/events/{slug}".to_string()),
            ..Default::default()
        }]);
        let err = Settings::from_raw(raw).expect_err("template lacks locale");
        assert!(matches!(err, LoadError::Invalid { key: "collections", .. }));
    }

    #[test]
    fn zero_values_are_rejected() {
        let mut raw = RawSettings::default();
        raw.cache.response_limit = 0;
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.hooks.purge_timeout_seconds = Some(0);
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn config_file_layers_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            r#"
[site]
locales = ["en", "de"]
default_locale = "de"
public_url = "https://example.org"

[hooks]
secret = "s3cret"
purge_webhooks = ["https://edge.example.org/revalidate"]

[[collections]]
collection = "pages"

[[collections]]
collection = "events"
detail = "/{{locale}}/events/{{slug}}"
lookahead = 2
"#
        )
        .expect("write config");

        let cli = CliArgs {
            config_file: Some(file.path().to_path_buf()),
            command: Some(Command::Plan(PlanArgs {
                event: PathBuf::from("event.json"),
            })),
        };
        let settings = load(&cli).expect("settings load");

        assert_eq!(settings.site.locales.default_locale().as_str(), "de");
        assert_eq!(settings.site.public_url.as_str(), "https://example.org/");
        assert_eq!(settings.hooks.secret.as_deref(), Some("s3cret"));
        assert_eq!(settings.hooks.purge_webhooks.len(), 1);
        let events = settings
            .collections
            .get(&CollectionName::new("events"))
            .expect("events configured");
        assert_eq!(events.lookahead, 2);
        assert!(
            settings
                .collections
                .get(&CollectionName::new("posts"))
                .is_none()
        );
    }
}
