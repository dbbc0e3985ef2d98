//! # Crawl Metrics Core
//!
//! Crate compartilhada com as estruturas de dados, o protocolo JSON das
//! amostras, a configuração TOML e o motor de estado derivado (buffer,
//! alertas e projeção para gráfico) do cliente de métricas do crawler.
//!
//! ## Módulos
//! - [`types`] – `Sample` e o placeholder "sem dados" ([`Latest`])
//! - [`protocol`] – Decode/encode de frames de texto JSON
//! - [`config`] – Configuração unificada via TOML
//! - [`store`] – Buffer ordenado de amostras recebidas
//! - [`alerts`] – Thresholds e avaliação de alertas
//! - [`chart`] – Projeção do histórico em série para gráfico

pub mod types;
pub mod protocol;
pub mod config;
pub mod store;
pub mod alerts;
pub mod chart;

// Re-exports convenientes
pub use types::{Latest, Sample};
pub use protocol::{decode_sample, encode_sample, DecodeError};
pub use config::{AppConfig, ConfigurationError};
pub use store::MetricsStore;
pub use alerts::{AlertEvent, AlertKind, AlertLevel, ThresholdEvaluator};
pub use chart::{ChartPoint, ChartProjector, ChartSeries};
