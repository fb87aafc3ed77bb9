use std::{process::ExitCode, sync::Arc};

use vdl_core::{config::Config, download::DownloadOrchestrator};
use vdl_ytdlp::{YtDlpConfig, YtDlpFetcher};

#[tokio::main]
async fn main() -> ExitCode {
    // The token check comes first: without it the bot never starts polling.
    let cfg = match Config::load() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = vdl_core::logging::init("vdl") {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    let fetcher = Arc::new(YtDlpFetcher::new(YtDlpConfig {
        program: cfg.ytdlp_path.clone(),
        verbose: cfg.ytdlp_verbose,
    }));
    let orchestrator = DownloadOrchestrator::new(fetcher, cfg.download_timeout);

    if let Err(e) = vdl_telegram::router::run_polling(cfg, orchestrator).await {
        tracing::error!(error = %e, "telegram bot failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
