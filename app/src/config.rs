// app/src/config.rs

use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
  Postgres,
  Memory,
}

impl FromStr for StorageBackend {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
      "memory" => Ok(StorageBackend::Memory),
      other => Err(format!("unknown storage backend '{}'", other)),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = String;

  fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "pretty" | "text" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(format!("unknown log format '{}'", other)),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub storage_backend: StorageBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  pub rate_limit_enabled: bool,
  pub rate_limit_max_requests: usize,
  pub rate_limit_window: Duration,

  pub cache_enabled: bool,
  pub cache_ttl: Duration,
  pub cache_max_entries: usize,

  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      storage_backend: StorageBackend::Postgres,
      database_url: None,
      database_max_connections: 10,
      run_migrations: true,
      rate_limit_enabled: true,
      rate_limit_max_requests: 100,
      rate_limit_window: Duration::from_secs(60),
      cache_enabled: true,
      cache_ttl: Duration::from_secs(60),
      cache_max_entries: 1000,
      log_format: LogFormat::Pretty,
    }
  }
}

impl AppConfig {
  /// Loads `.env` if present, then reads the process environment.
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the config from an arbitrary variable source. Unset variables
  /// take their defaults; set but malformed ones are an error naming the
  /// variable.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let defaults = Self::default();
    let typed = |name: &'static str| TypedVar { name, raw: lookup(name) };

    let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
    let server_port = typed("SERVER_PORT").or(defaults.server_port)?;

    let storage_backend = typed("STORAGE_BACKEND").or(defaults.storage_backend)?;
    let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
    if storage_backend == StorageBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required for the postgres backend)".to_string(),
      ));
    }
    let database_max_connections = typed("DATABASE_MAX_CONNECTIONS").or(defaults.database_max_connections)?;
    let run_migrations = typed("RUN_MIGRATIONS").or(defaults.run_migrations)?;

    let rate_limit_enabled = typed("RATE_LIMIT_ENABLED").or(defaults.rate_limit_enabled)?;
    let rate_limit_max_requests = typed("RATE_LIMIT_MAX_REQUESTS").or(defaults.rate_limit_max_requests)?;
    let rate_limit_window_secs = typed("RATE_LIMIT_WINDOW_SECS").or(defaults.rate_limit_window.as_secs())?;

    let cache_enabled = typed("CACHE_ENABLED").or(defaults.cache_enabled)?;
    let cache_ttl_secs = typed("CACHE_TTL_SECS").or(defaults.cache_ttl.as_secs())?;
    let cache_max_entries = typed("CACHE_MAX_ENTRIES").or(defaults.cache_max_entries)?;

    let log_format = typed("LOG_FORMAT").or(defaults.log_format)?;

    Ok(Self {
      server_host,
      server_port,
      storage_backend,
      database_url,
      database_max_connections,
      run_migrations,
      rate_limit_enabled,
      rate_limit_max_requests,
      rate_limit_window: Duration::from_secs(rate_limit_window_secs),
      cache_enabled,
      cache_ttl: Duration::from_secs(cache_ttl_secs),
      cache_max_entries,
      log_format,
    })
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

struct TypedVar {
  name: &'static str,
  raw: Option<String>,
}

impl TypedVar {
  fn or<T>(self, default: T) -> Result<T>
  where
    T: FromStr,
    T::Err: std::fmt::Display,
  {
    match self.raw {
      None => Ok(default),
      Some(raw) => raw
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", self.name, e))),
    }
  }
}
