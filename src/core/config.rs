use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    pub swagger: SwaggerConfig,
    pub cdn: CdnConfig,
    pub cleanup: CleanupConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Credentials guarding the admin CMS routes (HTTP basic auth)
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// S3-compatible image CDN configuration
#[derive(Debug, Clone)]
pub struct CdnConfig {
    /// CDN endpoint URL (internal, used for uploads/deletes)
    pub endpoint: String,
    /// Public endpoint URL used to build image URLs served to readers
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing images
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Key prefix for uploaded article images
    pub upload_folder: String,
}

/// Image lifecycle tracking configuration
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Days an unused image is kept before the sweep may delete it
    pub grace_period_days: i64,
    /// Interval between automatic sweeps; 0 disables the background worker
    pub sweep_interval_secs: u64,
    /// Number of CDN deletes in flight at once during a sweep
    pub delete_concurrency: usize,
    /// Timeout applied to each CDN delete call
    pub cdn_timeout_secs: u64,
    /// Maximum records processed in one sweep
    pub sweep_batch_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            admin: AdminConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            cdn: CdnConfig::from_env()?,
            cleanup: CleanupConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Default values for database connection pool (conservative defaults for small-medium apps)
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AdminConfig {
    pub fn from_env() -> Result<Self, String> {
        let username = env::var("ADMIN_USERNAME")
            .map_err(|_| "ADMIN_USERNAME environment variable is required".to_string())?;

        let password = env::var("ADMIN_PASSWORD")
            .map_err(|_| "ADMIN_PASSWORD environment variable is required".to_string())?;

        Ok(Self { username, password })
    }

    /// Returns credentials in "username:password" format
    pub fn credentials(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Inkpress API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "API documentation for Inkpress".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl CdnConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("CDN_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint = env::var("CDN_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("CDN_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("CDN_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket = env::var("CDN_BUCKET").unwrap_or_else(|_| "inkpress-images".to_string());

        let region = env::var("CDN_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let upload_folder =
            env::var("CDN_UPLOAD_FOLDER").unwrap_or_else(|_| "articles".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            upload_folder,
        })
    }

    /// Base URL under which uploaded images are publicly served.
    ///
    /// The content URL extractor matches image references against this prefix.
    pub fn public_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.public_endpoint.trim_end_matches('/'),
            self.bucket
        )
    }
}

impl CleanupConfig {
    const DEFAULT_GRACE_PERIOD_DAYS: i64 = 7;
    const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_DELETE_CONCURRENCY: usize = 4;
    const DEFAULT_CDN_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_SWEEP_BATCH_SIZE: i64 = 100;

    pub fn from_env() -> Result<Self, String> {
        let grace_period_days = env::var("IMAGE_GRACE_PERIOD_DAYS")
            .unwrap_or_else(|_| Self::DEFAULT_GRACE_PERIOD_DAYS.to_string())
            .parse::<i64>()
            .map_err(|_| "IMAGE_GRACE_PERIOD_DAYS must be a valid number".to_string())?;

        let sweep_interval_secs = env::var("IMAGE_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SWEEP_INTERVAL_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "IMAGE_SWEEP_INTERVAL_SECS must be a valid number".to_string())?;

        let delete_concurrency = env::var("IMAGE_DELETE_CONCURRENCY")
            .unwrap_or_else(|_| Self::DEFAULT_DELETE_CONCURRENCY.to_string())
            .parse::<usize>()
            .map_err(|_| "IMAGE_DELETE_CONCURRENCY must be a valid number".to_string())?;

        let cdn_timeout_secs = env::var("IMAGE_CDN_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_CDN_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "IMAGE_CDN_TIMEOUT_SECS must be a valid number".to_string())?;

        let sweep_batch_size = env::var("IMAGE_SWEEP_BATCH_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_SWEEP_BATCH_SIZE.to_string())
            .parse::<i64>()
            .map_err(|_| "IMAGE_SWEEP_BATCH_SIZE must be a valid number".to_string())?;

        if delete_concurrency == 0 {
            return Err("IMAGE_DELETE_CONCURRENCY must be at least 1".to_string());
        }

        Ok(Self {
            grace_period_days,
            sweep_interval_secs,
            delete_concurrency,
            cdn_timeout_secs,
            sweep_batch_size,
        })
    }

    pub fn grace_period(&self) -> chrono::Duration {
        chrono::Duration::days(self.grace_period_days)
    }

    pub fn cdn_timeout(&self) -> Duration {
        Duration::from_secs(self.cdn_timeout_secs)
    }
}
