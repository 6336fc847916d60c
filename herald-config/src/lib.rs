//! Loader for Herald configuration with YAML + environment overlays.
//!
//! Sources merge in this order, later ones winning:
//!
//! 1. YAML files / inline snippets, in the order they were added
//! 2. `HERALD__`-prefixed environment variables (`__` separates path segments,
//!    e.g. `HERALD__TWITCH__USER_ID`)
//!
//! String values may reference other variables as `${VAR}` or `$VAR`; they are
//! expanded after merging. Unknown variables are left untouched and caught by
//! [`HeraldConfig::validate`] when they sit in a required field. Environment
//! values are type-sniffed (`1234` becomes a number), so scalar fields that
//! may look numeric deserialize leniently.
use config::{Config, ConfigError, Environment, File, FileFormat};
use herald_common::HeraldError;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

mod de;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "HERALD";

#[derive(Debug, Clone, Deserialize)]
pub struct HeraldConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub twitch: TwitchConfig,
    pub llm: LlmConfig,
    pub x: XConfig,
    pub bluesky: BlueskyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: herald_common::observability::LogFormat,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default = "default_true", deserialize_with = "de::boolean")]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: Default::default(),
            dir: None,
            stderr: true,
            filter: default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// `memory` or a `sqlite:` URL.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

/// Video platform (Twitch) credentials and webhook settings.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchConfig {
    #[serde(deserialize_with = "de::string")]
    pub user_id: String,
    #[serde(deserialize_with = "de::string")]
    pub client_id: String,
    #[serde(deserialize_with = "de::string")]
    pub app_access_token: String,
    /// EventSub secret; when set, webhook signatures are enforced.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub webhook_secret: Option<String>,
    #[serde(default = "default_twitch_api")]
    pub api_base: String,
    /// Public channel link used by the fallback announcement.
    #[serde(default)]
    pub channel_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum LlmConfig {
    WorkersAi {
        #[serde(deserialize_with = "de::string")]
        account_id: String,
        #[serde(deserialize_with = "de::string")]
        api_token: String,
        #[serde(default = "default_workers_ai_model")]
        model: String,
        #[serde(default = "default_cloudflare_api")]
        api_base: String,
        #[serde(default)]
        gateway: Option<GatewayConfig>,
        #[serde(default, deserialize_with = "de::opt_u32")]
        max_tokens: Option<u32>,
        #[serde(default, deserialize_with = "de::opt_f32")]
        temperature: Option<f32>,
    },
    Openai {
        #[serde(deserialize_with = "de::string")]
        api_key: String,
        #[serde(default = "default_openai_model")]
        model: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default, deserialize_with = "de::opt_u32")]
        max_tokens: Option<u32>,
        #[serde(default, deserialize_with = "de::opt_f32")]
        temperature: Option<f32>,
    },
}

/// Cloudflare AI Gateway routing options for Workers AI.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(deserialize_with = "de::string")]
    pub id: String,
    #[serde(default, deserialize_with = "de::boolean")]
    pub skip_cache: bool,
    #[serde(default, deserialize_with = "de::opt_u64")]
    pub cache_ttl: Option<u64>,
    #[serde(default = "default_gateway_base")]
    pub base: String,
}

/// Network A: X OAuth 2.0 application.
#[derive(Debug, Clone, Deserialize)]
pub struct XConfig {
    #[serde(deserialize_with = "de::string")]
    pub client_id: String,
    #[serde(deserialize_with = "de::string")]
    pub client_secret: String,
    pub redirect_uri: String,
    /// Usernames allowed to complete the OAuth callback.
    #[serde(default)]
    pub allowed_usernames: Vec<String>,
    #[serde(default = "default_x_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_x_api")]
    pub api_base: String,
    #[serde(default = "default_x_authorize_url")]
    pub authorize_url: String,
}

/// Network B: Bluesky account.
#[derive(Debug, Clone, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default = "default_bluesky_service")]
    pub service: String,
    #[serde(deserialize_with = "de::string")]
    pub identifier: String,
    #[serde(deserialize_with = "de::string")]
    pub password: String,
    #[serde(default = "default_langs")]
    pub langs: Vec<String>,
}

fn default_true() -> bool {
    true
}
fn default_bind() -> String {
    "0.0.0.0:8787".into()
}
fn default_filter() -> String {
    "info,tower_http=info".into()
}
fn default_database_url() -> String {
    "sqlite://herald.db?mode=rwc".into()
}
fn default_twitch_api() -> String {
    "https://api.twitch.tv/helix/".into()
}
fn default_cloudflare_api() -> String {
    "https://api.cloudflare.com/client/v4/".into()
}
fn default_gateway_base() -> String {
    "https://gateway.ai.cloudflare.com/v1/".into()
}
fn default_workers_ai_model() -> String {
    "@cf/meta/llama-3.1-8b-instruct".into()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".into()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_x_scopes() -> Vec<String> {
    ["tweet.read", "tweet.write", "users.read", "offline.access"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_x_api() -> String {
    "https://api.x.com/".into()
}
fn default_x_authorize_url() -> String {
    "https://x.com/i/oauth2/authorize".into()
}
fn default_bluesky_service() -> String {
    "https://bsky.social".into()
}
fn default_langs() -> Vec<String> {
    vec!["en".into()]
}

fn is_unset(s: &str) -> bool {
    let s = s.trim();
    s.is_empty() || s.contains("${")
}

impl HeraldConfig {
    /// Drop optional values that are blank or still hold an unexpanded
    /// `${VAR}` placeholder.
    pub fn normalize(mut self) -> Self {
        fn clear(opt: &mut Option<String>) {
            if opt.as_deref().is_some_and(is_unset) {
                *opt = None;
            }
        }
        clear(&mut self.twitch.webhook_secret);
        clear(&mut self.twitch.channel_url);
        clear(&mut self.logging.dir);
        self.x.allowed_usernames.retain(|u| !is_unset(u));
        self
    }

    /// Reject configurations with blank or unexpanded required fields.
    pub fn validate(&self) -> Result<(), HeraldError> {
        let mut required: Vec<(&str, &str)> = vec![
            ("twitch.user_id", self.twitch.user_id.as_str()),
            ("twitch.client_id", self.twitch.client_id.as_str()),
            ("twitch.app_access_token", self.twitch.app_access_token.as_str()),
            ("x.client_id", self.x.client_id.as_str()),
            ("x.client_secret", self.x.client_secret.as_str()),
            ("x.redirect_uri", self.x.redirect_uri.as_str()),
            ("bluesky.identifier", self.bluesky.identifier.as_str()),
            ("bluesky.password", self.bluesky.password.as_str()),
        ];
        match &self.llm {
            LlmConfig::WorkersAi {
                account_id,
                api_token,
                ..
            } => {
                required.push(("llm.account_id", account_id.as_str()));
                required.push(("llm.api_token", api_token.as_str()));
            }
            LlmConfig::Openai { api_key, .. } => required.push(("llm.api_key", api_key.as_str())),
        }

        let missing: Vec<&str> = required
            .into_iter()
            .filter(|(_, v)| is_unset(v))
            .map(|(k, _)| k)
            .collect();
        if !missing.is_empty() {
            return Err(HeraldError::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }
        if self.x.allowed_usernames.is_empty() {
            return Err(HeraldError::Config(
                "x.allowed_usernames must name at least one account".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder that hides the `config` crate wiring (YAML + env overrides).
pub struct HeraldConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HeraldConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HeraldConfigLoader {
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a file that must exist; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely purely on
    /// environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use herald_config::{HeraldConfigLoader, LlmConfig};
    ///
    /// let cfg = HeraldConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// twitch: { user_id: 141981764, client_id: "cid", app_access_token: "tok" }
    /// llm: { provider: workers_ai, account_id: "acct", api_token: "cf" }
    /// x: { client_id: "x", client_secret: "s", redirect_uri: "https://bot.example/auth/x", allowed_usernames: ["me"] }
    /// bluesky: { identifier: "me.bsky.social", password: "app-pass" }
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.twitch.user_id, "141981764");
    /// assert!(matches!(cfg.llm, LlmConfig::WorkersAi { .. }));
    /// assert_eq!(cfg.bluesky.service, "https://bsky.social");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// `${VAR}` placeholders are expanded before the typed structs are built;
    /// optional settings left blank are normalized away.
    pub fn load(self) -> Result<HeraldConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("x.allowed_usernames")
                    .with_list_parse_key("x.scopes")
                    .with_list_parse_key("bluesky.langs"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: HeraldConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINIMAL: &str = r#"
twitch: { user_id: "1", client_id: "cid", app_access_token: "tok", webhook_secret: "${HERALD_TEST_UNSET_SECRET}" }
llm: { provider: openai, api_key: "sk" }
x: { client_id: "x", client_secret: "s", redirect_uri: "https://bot/auth/x", allowed_usernames: ["me"] }
bluesky: { identifier: "me.bsky.social", password: "pw" }
"#;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${STATE}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unresolved_optional_secret_is_dropped() {
        let cfg = HeraldConfigLoader::new().with_yaml_str(MINIMAL).load().unwrap();
        assert_eq!(cfg.twitch.webhook_secret, None);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_names_missing_fields() {
        let mut cfg = HeraldConfigLoader::new().with_yaml_str(MINIMAL).load().unwrap();
        cfg.bluesky.password = "${BLUESKY_PASSWORD}".into();
        cfg.twitch.client_id = String::new();
        let err = cfg.validate().unwrap_err().to_string();
        assert!(err.contains("bluesky.password"));
        assert!(err.contains("twitch.client_id"));
    }

    #[test]
    fn empty_allowlist_is_rejected() {
        let mut cfg = HeraldConfigLoader::new().with_yaml_str(MINIMAL).load().unwrap();
        cfg.x.allowed_usernames.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_are_filled_in() {
        let cfg = HeraldConfigLoader::new().with_yaml_str(MINIMAL).load().unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8787");
        assert_eq!(cfg.x.api_base, "https://api.x.com/");
        assert!(cfg.x.scopes.iter().any(|s| s == "offline.access"));
        assert_eq!(cfg.bluesky.langs, vec!["en".to_string()]);
        assert!(cfg.logging.stderr);
    }
}
