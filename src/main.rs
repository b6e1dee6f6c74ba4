//! Study quiz backend binary.
//!
//! Env:
//!   PORT               : u16 (default 3000)
//!   BACKEND_URL        : PostgREST-compatible data backend; in-memory bank if unset
//!   BACKEND_API_KEY    : sent as `apikey` and bearer token to the backend
//!   STUDY_CONFIG_PATH  : path to TOML config (session settings, quiz bank, decks)
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use study_quiz_backend::routes::build_router;
use study_quiz_backend::state::AppState;
use study_quiz_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let state = Arc::new(AppState::new());
  state.spawn_sweeper();
  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "study_backend", %addr, backend = state.backend.name(), "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
