// app/src/main.rs

use actix_web::middleware::from_fn;
use actix_web::{web as actix_data, App, HttpServer};
use storefront_app::config::{AppConfig, LogFormat};
use storefront_app::state::AppState;
use storefront_app::web::{configure_app_routes, middleware::rate_limit};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);

  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  // The log format itself comes from the config, so a config error is
  // reported through a default subscriber.
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => {
      init_tracing(cfg.log_format);
      cfg
    }
    Err(e) => {
      init_tracing(LogFormat::Pretty);
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  tracing::info!(
    backend = ?app_config.storage_backend,
    rate_limit_enabled = app_config.rate_limit_enabled,
    cache_enabled = app_config.cache_enabled,
    "Starting storefront server..."
  );

  let server_address = app_config.bind_address();
  let app_state = match AppState::from_config(app_config).await {
    Ok(state) => state,
    Err(e) => {
      tracing::error!(error = %e, "Failed to initialise application state.");
      return Err(std::io::Error::other(e.to_string()));
    }
  };

  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(from_fn(rate_limit))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
