//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Environment Variable Names
// =============================================================================

pub const ENV_FLASK_APP: &str = "FLASK_APP";
pub const ENV_FLASK_ENV: &str = "FLASK_ENV";
pub const ENV_SECRET_KEY: &str = "SECRET_KEY";
pub const ENV_AZURE_OPENAI_API_KEY: &str = "AZURE_OPENAI_API_KEY";
pub const ENV_AZURE_OPENAI_ENDPOINT: &str = "AZURE_OPENAI_ENDPOINT";
pub const ENV_AZURE_OPENAI_MODEL: &str = "AZURE_OPENAI_MODEL";
pub const ENV_AZURE_OPENAI_API_VERSION: &str = "AZURE_OPENAI_API_VERSION";
pub const ENV_AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_AWS_REGION: &str = "AWS_REGION";
pub const ENV_AWS_S3_BUCKET: &str = "AWS_S3_BUCKET";
pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
pub const ENV_MONGODB_DATABASE: &str = "MONGODB_DATABASE";
pub const ENV_REDIS_URL: &str = "REDIS_URL";
pub const ENV_LLM_PROVIDER: &str = "LLM_PROVIDER";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_HOST: &str = "HOST";
pub const ENV_PORT: &str = "PORT";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_JWT_EXPIRATION_HOURS: &str = "JWT_EXPIRATION_HOURS";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
pub const ENV_LLM_TIMEOUT_SECS: &str = "LLM_TIMEOUT_SECS";

/// Older spellings still honoured when the primary key is unset.
pub const LEGACY_ENV_AWS_ACCESS_KEY: &str = "AWS_ACCESS_KEY";
pub const LEGACY_ENV_AWS_SECRET_KEY: &str = "AWS_SECRET_KEY";
pub const LEGACY_ENV_GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

/// Every key an operator is expected to find in `.env.example`.
pub const TEMPLATE_KEYS: &[&str] = &[
    ENV_FLASK_APP,
    ENV_FLASK_ENV,
    ENV_SECRET_KEY,
    ENV_AZURE_OPENAI_API_KEY,
    ENV_AZURE_OPENAI_ENDPOINT,
    ENV_AZURE_OPENAI_MODEL,
    ENV_AWS_ACCESS_KEY_ID,
    ENV_AWS_SECRET_ACCESS_KEY,
    ENV_AWS_REGION,
    ENV_MONGODB_URI,
];

/// Keys that are understood but not required in the template.
pub const OPTIONAL_KEYS: &[&str] = &[
    ENV_AZURE_OPENAI_API_VERSION,
    ENV_AWS_S3_BUCKET,
    ENV_MONGODB_DATABASE,
    ENV_REDIS_URL,
    ENV_LLM_PROVIDER,
    ENV_OPENAI_API_KEY,
    ENV_GEMINI_API_KEY,
    ENV_HOST,
    ENV_PORT,
    ENV_CORS_ORIGINS,
    ENV_JWT_EXPIRATION_HOURS,
    ENV_REQUEST_TIMEOUT_SECS,
    ENV_LLM_TIMEOUT_SECS,
    LEGACY_ENV_AWS_ACCESS_KEY,
    LEGACY_ENV_AWS_SECRET_KEY,
    LEGACY_ENV_GOOGLE_API_KEY,
    "RUST_LOG",
];

// =============================================================================
// Authentication & Security
// =============================================================================

/// Default JWT token expiration in hours
pub const DEFAULT_JWT_EXPIRATION_HOURS: i64 = 1;

/// Minimum secret length outside development mode
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

/// Seconds per hour (for token expiration calculation)
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Authorization header prefix for Bearer tokens
pub const BEARER_TOKEN_PREFIX: &str = "Bearer ";

/// JWT token type identifier
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

// =============================================================================
// User Roles
// =============================================================================

/// Default role assigned to new users
pub const ROLE_DOCTOR: &str = "doctor";

/// Administrator role with elevated privileges
pub const ROLE_ADMIN: &str = "admin";

// =============================================================================
// Server Configuration
// =============================================================================

pub const DEFAULT_APP_NAME: &str = "app";

/// Default server host address
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default server port
pub const DEFAULT_SERVER_PORT: u16 = 5002;

/// Default allowed browser origin
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Global request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Largest accepted upload (25 MiB)
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

// =============================================================================
// Database
// =============================================================================

/// Database used when the connection string does not name one
pub const DEFAULT_MONGODB_DATABASE: &str = "sperow";

pub const COLLECTION_USERS: &str = "users";
pub const COLLECTION_CONSULTATIONS: &str = "consultations";

/// MongoDB duplicate key error code
pub const MONGO_DUPLICATE_KEY: i32 = 11000;

// =============================================================================
// Cache (Redis)
// =============================================================================

/// Default Redis URL (for development)
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Lifetime of per-doctor session data (1 hour)
pub const SESSION_TTL_SECONDS: u64 = 3600;

/// Cache key prefix for per-doctor session data
pub const CACHE_PREFIX_USER: &str = "user:";

/// Cache key prefix for extracted document text
pub const CACHE_PREFIX_CACHED_TEXT: &str = "cached_text:";

/// Cache key prefix for rate limiting
pub const CACHE_PREFIX_RATE_LIMIT: &str = "rate_limit:";

pub const SESSION_KEY_MEDICAL_RECORD: &str = "medical_record";
pub const SESSION_KEY_STRUCTURED_SUMMARY: &str = "structured_summary";

// =============================================================================
// Rate Limiting
// =============================================================================

/// Default rate limit: requests per window
pub const RATE_LIMIT_REQUESTS: u64 = 100;

/// Default rate limit window in seconds (1 minute)
pub const RATE_LIMIT_WINDOW_SECONDS: u64 = 60;

/// Stricter rate limit for auth endpoints: requests per window
pub const RATE_LIMIT_AUTH_REQUESTS: u64 = 10;

/// Auth rate limit window in seconds (1 minute)
pub const RATE_LIMIT_AUTH_WINDOW_SECONDS: u64 = 60;

// =============================================================================
// Document Extraction (AWS)
// =============================================================================

pub const DEFAULT_S3_BUCKET: &str = "sperow-medical-records";

/// S3 key prefix for uploaded documents
pub const S3_UPLOAD_PREFIX: &str = "uploads/";

/// Delay between Textract job status polls
pub const TEXTRACT_POLL_INTERVAL_SECS: u64 = 2;

/// Give up on a Textract job after this many polls (100 seconds), inside the
/// default request timeout
pub const TEXTRACT_MAX_POLLS: u32 = 50;

// =============================================================================
// Language Models
// =============================================================================

pub const LLM_PROVIDER_AZURE_OPENAI: &str = "azure_openai";
pub const LLM_PROVIDER_OPENAI: &str = "openai";

pub const DEFAULT_AZURE_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_AZURE_OPENAI_API_VERSION: &str = "2024-05-01-preview";
pub const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-4o";

pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 110;
pub const LLM_MAX_TOKENS: u32 = 4096;
pub const SUMMARY_TEMPERATURE: f32 = 0.1;
pub const CHAT_TEMPERATURE: f32 = 0.7;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-2.0-flash-exp";

// =============================================================================
// Validation
// =============================================================================

/// Minimum password length requirement
pub const MIN_PASSWORD_LENGTH: u64 = 8;

/// Maximum username length
pub const MAX_USERNAME_LENGTH: u64 = 64;
