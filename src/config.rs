use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Custom S3 endpoint (MinIO). Unset means AWS.
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Prefix of every public object URL, without trailing slash.
    pub public_base_url: String,
}

impl StorageConfig {
    /// URL prefixes that `remove(url)` accepts, each ending in `/`.
    pub fn recognized_prefixes(&self) -> Vec<String> {
        let mut prefixes = vec![
            format!("{}/", self.public_base_url),
            format!("https://{}.s3.{}.amazonaws.com/", self.bucket, self.region),
            format!("https://{}.s3.amazonaws.com/", self.bucket),
        ];
        prefixes.dedup();
        prefixes
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: usize,
    pub allowed_content_types: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Zero disables the background sweep.
    pub interval_secs: u64,
    pub grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub uploads: UploadConfig,
    pub sweep: SweepConfig,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} is not set"));

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "folio".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "folio-admin".into()),
            ttl_minutes: parsed(&lookup, "JWT_TTL_MINUTES", 60 * 24)?,
        };

        let bucket = required("AWS_S3_BUCKET_NAME")?;
        let region = lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".into());
        let endpoint = lookup("S3_ENDPOINT").map(|e| e.trim_end_matches('/').to_string());
        let public_base_url = match lookup("S3_PUBLIC_BASE_URL") {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => match &endpoint {
                Some(endpoint) => format!("{endpoint}/{bucket}"),
                None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
            },
        };
        let storage = StorageConfig {
            bucket,
            region,
            endpoint,
            access_key: lookup("AWS_ACCESS_KEY_ID"),
            secret_key: lookup("AWS_SECRET_ACCESS_KEY"),
            public_base_url,
        };

        let uploads = UploadConfig {
            max_bytes: parsed(&lookup, "UPLOAD_MAX_BYTES", 20 * 1024 * 1024)?,
            allowed_content_types: lookup("UPLOAD_ALLOWED_TYPES")
                .map(|v| split_list(&v))
                .unwrap_or_else(|| {
                    ["application/pdf", "image/jpeg", "image/png", "image/webp"]
                        .into_iter()
                        .map(String::from)
                        .collect()
                }),
        };

        let sweep = SweepConfig {
            interval_secs: parsed(&lookup, "SWEEP_INTERVAL_SECS", 300)?,
            grace_secs: parsed(&lookup, "SWEEP_GRACE_SECS", 900)?,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            jwt,
            storage,
            uploads,
            sweep,
            cors_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
        })
    }
}

/// Unset means `default`; a value that does not parse is an error naming the variable.
fn parsed<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
