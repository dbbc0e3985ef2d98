//! # Crawl Metrics Receiver
//!
//! Acompanha em tempo real as métricas publicadas pelo plugin de métricas
//! do crawler e registra alertas de taxa de erro e desempenho.
//!
//! ## Uso
//! ```bash
//! crawl_metrics_receiver                                  # config.toml ao lado do executável
//! crawl_metrics_receiver --endpoint ws://host:3001/ws/metrics
//! crawl_metrics_receiver --config /etc/crawl/config.toml
//! ```

use crawl_metrics_core::chart::SERIES_NAMES;
use crawl_metrics_core::config::AppConfig;
use crawl_metrics_receiver::{Session, TracingSink};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();

    // ── Config ──
    let config_path = arg_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);
    let mut config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    if let Some(endpoint) = arg_value(&args, "--endpoint") {
        config.stream.endpoint = endpoint;
    }

    let mut session = match Session::new(config, TracingSink) {
        Ok(session) => session,
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    // ── Banner ──
    let cfg = session.config();
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ CRAWL METRICS – RECEIVER");
    println!("══════════════════════════════════════════════");
    println!("  Endpoint:    {}", cfg.stream.endpoint);
    println!(
        "  Thresholds:  erros > {} | desempenho < {}",
        cfg.alerts.error_threshold, cfg.alerts.performance_threshold
    );
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    if let Err(e) = session.run() {
        error!("{e}");
        return ExitCode::FAILURE;
    }

    let view = session.view();
    let latest = view.latest.sample();
    println!(
        "Última leitura: {} = {} | {} = {} | {} = {} | {} = {}%",
        SERIES_NAMES[0],
        latest.queue_size,
        SERIES_NAMES[1],
        latest.crawled,
        SERIES_NAMES[2],
        latest.errors,
        SERIES_NAMES[3],
        latest.performance
    );
    println!("Pontos no gráfico: {}", view.series.len());

    ExitCode::SUCCESS
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
