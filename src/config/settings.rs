//! Application settings loaded from environment variables.

use std::fmt;
use std::str::FromStr;

use super::constants::*;
use super::error::ConfigError;

/// Deployment mode, read from `FLASK_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!(
                "expected `development` or `production`, got `{}`",
                other
            )),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// AWS credentials and document bucket.
#[derive(Clone)]
pub struct AwsSettings {
    pub access_key_id: String,
    secret_access_key: String,
    pub region: String,
    pub bucket: String,
}

impl AwsSettings {
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }
}

impl fmt::Debug for AwsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSettings")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Chat completion provider selected by `LLM_PROVIDER`.
#[derive(Clone)]
pub enum LlmSettings {
    AzureOpenAi {
        api_key: String,
        endpoint: String,
        model: String,
        api_version: String,
    },
    OpenAi {
        api_key: String,
    },
}

impl LlmSettings {
    pub fn provider_name(&self) -> &'static str {
        match self {
            LlmSettings::AzureOpenAi { .. } => LLM_PROVIDER_AZURE_OPENAI,
            LlmSettings::OpenAi { .. } => LLM_PROVIDER_OPENAI,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmSettings::AzureOpenAi { model, .. } => model,
            LlmSettings::OpenAi { .. } => OPENAI_MODEL,
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmSettings::AzureOpenAi {
                endpoint,
                model,
                api_version,
                ..
            } => f
                .debug_struct("AzureOpenAi")
                .field("api_key", &"[REDACTED]")
                .field("endpoint", endpoint)
                .field("model", model)
                .field("api_version", api_version)
                .finish(),
            LlmSettings::OpenAi { .. } => f
                .debug_struct("OpenAi")
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub app_name: String,
    pub environment: Environment,
    secret_key: String,
    pub jwt_expiration_hours: i64,
    mongodb_uri: String,
    pub mongodb_database: String,
    pub redis_url: String,
    pub aws: AwsSettings,
    pub llm: LlmSettings,
    pub llm_timeout_secs: u64,
    gemini_api_key: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_name", &self.app_name)
            .field("environment", &self.environment)
            .field("secret_key", &"[REDACTED]")
            .field("jwt_expiration_hours", &self.jwt_expiration_hours)
            .field("mongodb_uri", &"[REDACTED]")
            .field("mongodb_database", &self.mongodb_database)
            .field("redis_url", &"[REDACTED]")
            .field("aws", &self.aws)
            .field("llm", &self.llm)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("cors_origins", &self.cors_origins)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset, so an untouched copy of the
    /// template fails the same way a missing key does.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let environment = match get(ENV_FLASK_ENV) {
            Some(raw) => raw
                .parse::<Environment>()
                .map_err(|reason| ConfigError::invalid(ENV_FLASK_ENV, reason))?,
            None => Environment::Development,
        };

        let secret_key = require(ENV_SECRET_KEY)?;
        if secret_key.len() < MIN_SECRET_KEY_LENGTH {
            if environment.is_development() {
                tracing::warn!(
                    "{} is shorter than {} characters; acceptable only for development",
                    ENV_SECRET_KEY,
                    MIN_SECRET_KEY_LENGTH
                );
            } else {
                return Err(ConfigError::invalid(
                    ENV_SECRET_KEY,
                    format!("must be at least {} characters", MIN_SECRET_KEY_LENGTH),
                ));
            }
        }

        let mongodb_uri = require(ENV_MONGODB_URI)?;
        if !(mongodb_uri.starts_with("mongodb://") || mongodb_uri.starts_with("mongodb+srv://")) {
            return Err(ConfigError::invalid(
                ENV_MONGODB_URI,
                "must start with mongodb:// or mongodb+srv://",
            ));
        }

        let aws = AwsSettings {
            access_key_id: get(ENV_AWS_ACCESS_KEY_ID)
                .or_else(|| get(LEGACY_ENV_AWS_ACCESS_KEY))
                .ok_or(ConfigError::Missing(ENV_AWS_ACCESS_KEY_ID))?,
            secret_access_key: get(ENV_AWS_SECRET_ACCESS_KEY)
                .or_else(|| get(LEGACY_ENV_AWS_SECRET_KEY))
                .ok_or(ConfigError::Missing(ENV_AWS_SECRET_ACCESS_KEY))?,
            region: require(ENV_AWS_REGION)?,
            bucket: get(ENV_AWS_S3_BUCKET).unwrap_or_else(|| DEFAULT_S3_BUCKET.to_string()),
        };

        let llm = match get(ENV_LLM_PROVIDER).as_deref() {
            None | Some(LLM_PROVIDER_AZURE_OPENAI) => {
                let endpoint = require(ENV_AZURE_OPENAI_ENDPOINT)?;
                if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                    return Err(ConfigError::invalid(
                        ENV_AZURE_OPENAI_ENDPOINT,
                        "must be an http(s) URL",
                    ));
                }
                LlmSettings::AzureOpenAi {
                    api_key: require(ENV_AZURE_OPENAI_API_KEY)?,
                    endpoint,
                    model: get(ENV_AZURE_OPENAI_MODEL)
                        .unwrap_or_else(|| DEFAULT_AZURE_OPENAI_MODEL.to_string()),
                    api_version: get(ENV_AZURE_OPENAI_API_VERSION)
                        .unwrap_or_else(|| DEFAULT_AZURE_OPENAI_API_VERSION.to_string()),
                }
            }
            Some(LLM_PROVIDER_OPENAI) => LlmSettings::OpenAi {
                api_key: require(ENV_OPENAI_API_KEY)?,
            },
            Some(other) => {
                return Err(ConfigError::invalid(
                    ENV_LLM_PROVIDER,
                    format!(
                        "expected `{}` or `{}`, got `{}`",
                        LLM_PROVIDER_AZURE_OPENAI, LLM_PROVIDER_OPENAI, other
                    ),
                ))
            }
        };

        let cors_origins = get(ENV_CORS_ORIGINS)
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_CORS_ORIGIN.to_string()]);

        Ok(Self {
            app_name: get(ENV_FLASK_APP).unwrap_or_else(|| DEFAULT_APP_NAME.to_string()),
            environment,
            secret_key,
            jwt_expiration_hours: parse_or(&get, ENV_JWT_EXPIRATION_HOURS, DEFAULT_JWT_EXPIRATION_HOURS)?,
            mongodb_uri,
            mongodb_database: get(ENV_MONGODB_DATABASE)
                .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
            redis_url: get(ENV_REDIS_URL).unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            aws,
            llm,
            llm_timeout_secs: parse_or(&get, ENV_LLM_TIMEOUT_SECS, DEFAULT_LLM_TIMEOUT_SECS)?,
            gemini_api_key: get(ENV_GEMINI_API_KEY).or_else(|| get(LEGACY_ENV_GOOGLE_API_KEY)),
            server_host: get(ENV_HOST).unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port: parse_or(&get, ENV_PORT, DEFAULT_SERVER_PORT)?,
            cors_origins,
            request_timeout_secs: parse_or(
                &get,
                ENV_REQUEST_TIMEOUT_SECS,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
        })
    }

    /// Get secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.secret_key.as_bytes()
    }

    pub fn mongodb_uri(&self) -> &str {
        &self.mongodb_uri
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }
}

/// Parse an optional numeric key, rejecting malformed values instead of
/// silently falling back to the default.
fn parse_or<G, T>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, e.to_string())),
        None => Ok(default),
    }
}
