use medcalc::config::AppConfig;
use medcalc::error::AppError;
use medcalc::ScoreService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) service: Arc<ScoreService>,
}

/// Scores directory from the environment, for commands that do not start the server.
pub(crate) fn configured_scores_dir() -> Result<PathBuf, AppError> {
    Ok(AppConfig::load()?.scores.directory)
}
