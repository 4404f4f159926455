use std::ops::RangeInclusive;
use std::path::PathBuf;

use banamon_cloud::{CredentialError, CredentialFile, S3Settings};
use banamon_core::upload::DEFAULT_MAX_UPLOAD_BYTES;

use crate::auth::jwt::{JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS, DEFAULT_REFRESH_EXPIRY_DAYS};

/// Default request timeout; model cold starts can take minutes.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_MODEL_NAME: &str = "banana_disease";
const DEFAULT_BLOB_LOCAL_DIR: &str = "storage/images";
const DEFAULT_S3_REGION: &str = "us-east-1";

const REQUEST_TIMEOUT_SECS_RANGE: RangeInclusive<u64> = 1..=3600;
/// Up to one week.
const ACCESS_EXPIRY_MINS_RANGE: RangeInclusive<i64> = 1..=7 * 24 * 60;
const REFRESH_EXPIRY_DAYS_RANGE: RangeInclusive<i64> = 1..=365;
/// Up to 1 GiB.
const MAX_UPLOAD_BYTES_RANGE: RangeInclusive<usize> = 1..=1024 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

/// Where uploaded images are written.
#[derive(Debug, Clone)]
pub enum BlobBackend {
    S3(S3Settings),
    Local { root: PathBuf },
    Memory,
}

/// How predictions are computed.
#[derive(Debug, Clone)]
pub enum InferenceBackend {
    /// Remote model server speaking the TensorFlow Serving REST API.
    Http { url: String, model_name: String },
    /// Frozen graph loaded into this process.
    TensorFlow { model_path: PathBuf },
}

/// Server configuration, loaded once at startup and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins; `*` allows any.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    pub database_url: String,
    pub project_id: String,
    pub credentials: Option<CredentialFile>,
    pub jwt: JwtConfig,
    pub blob: BlobBackend,
    pub inference: InferenceBackend,
    /// Version tag stamped on every prediction record.
    pub model_version: String,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// | Env Var                   | Required          | Default          |
    /// |---------------------------|-------------------|------------------|
    /// | `HOST`                    | no                | `0.0.0.0`        |
    /// | `PORT`                    | no                | `8080`           |
    /// | `CORS_ORIGINS`            | no                | `*`              |
    /// | `REQUEST_TIMEOUT_SECS`    | no                | `300`            |
    /// | `DATABASE_URL`            | **yes**           | --               |
    /// | `CLOUD_PROJECT_ID`        | **yes**           | --               |
    /// | `CREDENTIALS_FILE`        | no                | --               |
    /// | `JWT_SECRET`              | yes, unless in credential file | --  |
    /// | `JWT_ACCESS_EXPIRY_MINS`  | no                | `60`             |
    /// | `JWT_REFRESH_EXPIRY_DAYS` | no                | `30`             |
    /// | `BLOB_BACKEND`            | no                | `s3`             |
    /// | `IMAGES_BUCKET`           | for `s3`          | --               |
    /// | `S3_ENDPOINT_URL`         | no                | --               |
    /// | `S3_REGION`               | no                | `us-east-1`      |
    /// | `BLOB_LOCAL_DIR`          | no                | `storage/images` |
    /// | `INFERENCE_BACKEND`       | no                | `http`           |
    /// | `MODEL_SERVING_URL`       | for `http`        | --               |
    /// | `MODEL_NAME`              | no                | `banana_disease` |
    /// | `MODEL_PATH`              | for `tensorflow`  | --               |
    /// | `MODEL_VERSION`           | **yes**           | --               |
    /// | `MAX_UPLOAD_BYTES`        | no                | `10485760`       |
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup: &lookup };

        let host = env.or("HOST", "0.0.0.0");
        let port = env.parse_or("PORT", 8080u16)?;
        let cors_origins = env
            .or("CORS_ORIGINS", "*")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let request_timeout_secs = env.parse_in(
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
            REQUEST_TIMEOUT_SECS_RANGE,
        )?;

        let database_url = env.required("DATABASE_URL")?;
        let project_id = env.required("CLOUD_PROJECT_ID")?;

        let credentials = env
            .optional("CREDENTIALS_FILE")
            .map(CredentialFile::load)
            .transpose()?;

        let secret = env
            .optional("JWT_SECRET")
            .or_else(|| {
                credentials
                    .as_ref()
                    .and_then(CredentialFile::jwt_secret)
                    .map(str::to_string)
            })
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt = JwtConfig {
            secret,
            access_token_expiry_mins: env.parse_in(
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
                ACCESS_EXPIRY_MINS_RANGE,
            )?,
            refresh_token_expiry_days: env.parse_in(
                "JWT_REFRESH_EXPIRY_DAYS",
                DEFAULT_REFRESH_EXPIRY_DAYS,
                REFRESH_EXPIRY_DAYS_RANGE,
            )?,
        };

        let blob = match env.or("BLOB_BACKEND", "s3").as_str() {
            "s3" => BlobBackend::S3(S3Settings {
                bucket: env.required("IMAGES_BUCKET")?,
                region: env.or("S3_REGION", DEFAULT_S3_REGION),
                endpoint_url: env.optional("S3_ENDPOINT_URL"),
            }),
            "local" => BlobBackend::Local {
                root: env.or("BLOB_LOCAL_DIR", DEFAULT_BLOB_LOCAL_DIR).into(),
            },
            "memory" => BlobBackend::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: "BLOB_BACKEND",
                    value: other.to_string(),
                    reason: "expected one of s3, local, memory".into(),
                })
            }
        };

        let inference = match env.or("INFERENCE_BACKEND", "http").as_str() {
            "http" => InferenceBackend::Http {
                url: env.required("MODEL_SERVING_URL")?,
                model_name: env.or("MODEL_NAME", DEFAULT_MODEL_NAME),
            },
            "tensorflow" => InferenceBackend::TensorFlow {
                model_path: env.required("MODEL_PATH")?.into(),
            },
            other => {
                return Err(ConfigError::Invalid {
                    var: "INFERENCE_BACKEND",
                    value: other.to_string(),
                    reason: "expected one of http, tensorflow".into(),
                })
            }
        };

        let model_version = env.required("MODEL_VERSION")?;
        let max_upload_bytes = env.parse_in(
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
            MAX_UPLOAD_BYTES_RANGE,
        )?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            project_id,
            credentials,
            jwt,
            blob,
            inference,
            model_version,
            max_upload_bytes,
        })
    }
}

/// Typed accessors over a lookup function. Blank values count as unset.
struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    fn or(&self, var: &str, default: &str) -> String {
        self.optional(var).unwrap_or_else(|| default.to_string())
    }

    fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(var) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }

    /// Like [`parse_or`](Self::parse_or), but the value must fall in `range`.
    fn parse_in<T>(
        &self,
        var: &'static str,
        default: T,
        range: RangeInclusive<T>,
    ) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + PartialOrd + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let value = self.parse_or(var, default)?;
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::Invalid {
                var,
                value: value.to_string(),
                reason: format!("must be between {} and {}", range.start(), range.end()),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    fn base() -> HashMap<&'static str, String> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/banamon".to_string()),
            ("CLOUD_PROJECT_ID", "leaf-project".to_string()),
            ("JWT_SECRET", "s3cret".to_string()),
            ("IMAGES_BUCKET", "leaf-images".to_string()),
            ("MODEL_SERVING_URL", "http://localhost:8501".to_string()),
            ("MODEL_VERSION", "1.0.0".to_string()),
        ])
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<ServerConfig, ConfigError> {
        ServerConfig::load(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&base()).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.cors_origins, ["*"]);
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.jwt.access_token_expiry_mins, 60);
        assert_eq!(config.jwt.refresh_token_expiry_days, 30);
        assert_matches!(
            &config.blob,
            BlobBackend::S3(s) if s.bucket == "leaf-images" && s.region == "us-east-1"
        );
        assert_matches!(
            &config.inference,
            InferenceBackend::Http { model_name, .. } if model_name == "banana_disease"
        );
    }

    #[test]
    fn missing_required_values_fail_fast() {
        for var in ["DATABASE_URL", "CLOUD_PROJECT_ID", "JWT_SECRET", "MODEL_VERSION"] {
            let mut vars = base();
            vars.remove(var);
            assert_matches!(load(&vars), Err(ConfigError::Missing(v)) if v == var);
        }
    }

    #[test]
    fn blank_counts_as_missing() {
        let mut vars = base();
        vars.insert("MODEL_VERSION", "  ".into());
        assert_matches!(load(&vars), Err(ConfigError::Missing("MODEL_VERSION")));
    }

    #[test]
    fn bucket_only_required_for_s3() {
        let mut vars = base();
        vars.remove("IMAGES_BUCKET");
        assert_matches!(load(&vars), Err(ConfigError::Missing("IMAGES_BUCKET")));

        vars.insert("BLOB_BACKEND", "local".into());
        let config = load(&vars).unwrap();
        assert_matches!(config.blob, BlobBackend::Local { root } if root == PathBuf::from("storage/images"));
    }

    #[test]
    fn tensorflow_backend_needs_model_path() {
        let mut vars = base();
        vars.insert("INFERENCE_BACKEND", "tensorflow".into());
        assert_matches!(load(&vars), Err(ConfigError::Missing("MODEL_PATH")));

        vars.insert("MODEL_PATH", "/models/frozen.pb".into());
        assert_matches!(load(&vars).unwrap().inference, InferenceBackend::TensorFlow { .. });
    }

    #[test]
    fn unknown_backend_is_invalid() {
        let mut vars = base();
        vars.insert("BLOB_BACKEND", "ftp".into());
        assert_matches!(load(&vars), Err(ConfigError::Invalid { var: "BLOB_BACKEND", .. }));
    }

    #[test]
    fn bad_number_is_invalid() {
        let mut vars = base();
        vars.insert("PORT", "eighty".into());
        assert_matches!(load(&vars), Err(ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn out_of_range_numbers_are_invalid() {
        let cases = [
            ("JWT_ACCESS_EXPIRY_MINS", "0"),
            ("JWT_ACCESS_EXPIRY_MINS", "-5"),
            ("JWT_ACCESS_EXPIRY_MINS", "99999999"),
            ("JWT_REFRESH_EXPIRY_DAYS", "0"),
            ("JWT_REFRESH_EXPIRY_DAYS", "9223372036854775807"),
            ("MAX_UPLOAD_BYTES", "0"),
            ("MAX_UPLOAD_BYTES", "18446744073709551615"),
            ("REQUEST_TIMEOUT_SECS", "0"),
        ];
        for (var, value) in cases {
            let mut vars = base();
            vars.insert(var, value.into());
            assert_matches!(
                load(&vars),
                Err(ConfigError::Invalid { var: v, .. }) if v == var,
                "{var}={value}"
            );
        }
    }

    #[test]
    fn in_range_lifetimes_are_accepted() {
        let mut vars = base();
        vars.insert("JWT_ACCESS_EXPIRY_MINS", "15".into());
        vars.insert("JWT_REFRESH_EXPIRY_DAYS", "365".into());
        let config = load(&vars).unwrap();
        assert_eq!(config.jwt.access_token_expiry_mins, 15);
        assert_eq!(config.jwt.refresh_token_expiry_days, 365);
    }

    #[test]
    fn jwt_secret_falls_back_to_credential_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"jwt_secret": "from-file"}}"#).unwrap();

        let mut vars = base();
        vars.remove("JWT_SECRET");
        vars.insert("CREDENTIALS_FILE", file.path().display().to_string());

        let config = load(&vars).unwrap();
        assert_eq!(config.jwt.secret, "from-file");

        // The environment wins when both are set.
        vars.insert("JWT_SECRET", "from-env".into());
        assert_eq!(load(&vars).unwrap().jwt.secret, "from-env");
    }

    #[test]
    fn unreadable_credential_file_fails() {
        let mut vars = base();
        vars.insert("CREDENTIALS_FILE", "/nonexistent/creds.json".into());
        assert_matches!(load(&vars), Err(ConfigError::Credentials(_)));
    }

    #[test]
    fn cors_list_is_split() {
        let mut vars = base();
        vars.insert("CORS_ORIGINS", "http://a.test, http://b.test,".into());
        assert_eq!(load(&vars).unwrap().cors_origins, ["http://a.test", "http://b.test"]);
    }
}
