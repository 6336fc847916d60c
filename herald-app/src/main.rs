use anyhow::Result;
use herald_common::observability::{LogConfig, init_logging};
use herald_config::{HeraldConfig, HeraldConfigLoader};
use std::path::PathBuf;

const DEFAULT_CONFIG: &str = "herald.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1) Load config (env wins). An explicit HERALD_CONFIG must exist;
    //    the default file is optional so env-only deployments work.
    let loader = match std::env::var("HERALD_CONFIG") {
        Ok(path) => HeraldConfigLoader::new().with_file(path),
        Err(_) => HeraldConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    let cfg: HeraldConfig = loader.load()?;

    // 2) Logging as configured, before anything can fail noisily
    let log_file = init_logging(LogConfig {
        app_name: "herald",
        log_dir: cfg.logging.dir.as_ref().map(PathBuf::from),
        emit_stderr: cfg.logging.stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
    })?;
    if let Some(path) = log_file {
        tracing::info!(path = %path.display(), "logging.file");
    }

    cfg.validate()?;

    herald_app::run(cfg).await
}
