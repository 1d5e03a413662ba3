use std::env;
use std::path::{Path, PathBuf};

use clap::Parser;
use ct_common::{CandidateService, CsvCandidateStore, PdfReportGenerator, PreselectionConfig};

use crate::error::ApiError;

const DEFAULT_RATE_PER_SEC: u64 = 20;
const DEFAULT_RATE_BURST: u32 = 40;

#[derive(Debug, Clone, Parser)]
#[command(name = "ct-api", about = "HTTP API for the candidate tracker")]
pub(crate) struct Cli {
    /// CSV file holding the candidate records
    #[arg(long, env = "CT_DATA_PATH", default_value = "data/candidates.csv")]
    pub data_path: PathBuf,

    /// Directory where preselection reports are written
    #[arg(long, env = "CT_REPORT_DIR", default_value = "reports")]
    pub report_dir: PathBuf,

    /// Server port
    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Comma separated list of browser origins allowed to call the API
    #[arg(long, env = "CT_CORS_ORIGINS", default_value = "http://localhost:8501")]
    pub cors_origins: String,
}

/// Validated server settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub report_dir: PathBuf,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub(crate) fn from_cli(cli: Cli) -> Result<Self, ApiError> {
        if cli.data_path.as_os_str().is_empty() {
            return Err(ApiError::InvalidInput("CT_DATA_PATH must not be empty".into()));
        }

        let cors_origins: Vec<String> = cli
            .cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        // Credentialed CORS forbids the wildcard origin.
        if cors_origins.iter().any(|origin| origin == "*") {
            return Err(ApiError::InvalidInput(
                "CT_CORS_ORIGINS must name explicit origins, not '*'".into(),
            ));
        }

        Ok(Self {
            data_path: cli.data_path,
            report_dir: cli.report_dir,
            port: cli.port,
            cors_origins,
        })
    }

    /// Store and reports under `dir`, default port and origin.
    pub fn for_tests(dir: &Path) -> Self {
        Self {
            data_path: dir.join("candidates.csv"),
            report_dir: dir.join("reports"),
            port: 8000,
            cors_origins: vec!["http://localhost:8501".into()],
        }
    }

    pub(crate) fn build_service(&self, preselection: PreselectionConfig) -> CandidateService {
        CandidateService::new(
            CsvCandidateStore::new(&self.data_path),
            preselection,
            PdfReportGenerator::new(&self.report_dir),
        )
    }
}

/// Per-client request budget: a sustained rate plus a burst allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub per_sec: u64,
    pub burst: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_sec: DEFAULT_RATE_PER_SEC,
            burst: DEFAULT_RATE_BURST,
        }
    }
}

impl RateLimitConfig {
    /// Reads `CT_RATE_LIMIT_PER_SEC` and `CT_RATE_LIMIT_BURST`; zero or
    /// unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            per_sec: positive_env("CT_RATE_LIMIT_PER_SEC").unwrap_or(defaults.per_sec),
            burst: positive_env("CT_RATE_LIMIT_BURST").unwrap_or(defaults.burst),
        }
    }
}

fn positive_env<T>(name: &str) -> Option<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = env::var(name).ok()?.trim().parse::<T>().ok()?;
    (value > T::default()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn with_rate_env(per_sec: Option<&str>, burst: Option<&str>, check: impl FnOnce()) {
        let _lock = ENV_LOCK.lock().unwrap();
        let vars = [("CT_RATE_LIMIT_PER_SEC", per_sec), ("CT_RATE_LIMIT_BURST", burst)];
        let saved: Vec<_> = vars.iter().map(|(name, _)| env::var(name).ok()).collect();

        for (name, value) in vars {
            match value {
                Some(value) => unsafe { env::set_var(name, value) },
                None => unsafe { env::remove_var(name) },
            }
        }

        check();

        for ((name, _), previous) in vars.iter().zip(saved) {
            match previous {
                Some(value) => unsafe { env::set_var(name, value) },
                None => unsafe { env::remove_var(name) },
            }
        }
    }

    fn cli(cors_origins: &str) -> Cli {
        Cli {
            data_path: PathBuf::from("data/candidates.csv"),
            report_dir: PathBuf::from("reports"),
            port: 8000,
            cors_origins: cors_origins.into(),
        }
    }

    #[test]
    fn rate_limits_follow_env_overrides() {
        with_rate_env(Some("10"), Some("25"), || {
            assert_eq!(
                RateLimitConfig::from_env(),
                RateLimitConfig {
                    per_sec: 10,
                    burst: 25
                }
            );
        });
    }

    #[test]
    fn rate_limits_ignore_zero_and_garbage() {
        with_rate_env(Some("0"), Some("lots"), || {
            assert_eq!(RateLimitConfig::from_env(), RateLimitConfig::default());
        });
    }

    #[test]
    fn cors_origins_are_trimmed_and_wildcard_rejected() {
        let config = AppConfig::from_cli(cli("http://a.test, ,http://b.test")).unwrap();
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);

        let err = AppConfig::from_cli(cli("http://a.test,*")).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn empty_data_path_is_rejected() {
        let mut args = cli("http://a.test");
        args.data_path = PathBuf::new();
        assert!(AppConfig::from_cli(args).is_err());
    }
}
