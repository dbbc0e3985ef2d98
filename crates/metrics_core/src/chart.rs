//! Projeção do histórico de amostras em série pronta para gráfico.
//!
//! Um ponto por amostra, na ordem do buffer, sem suavização nem janela.

use crate::config::ChartConfig;
use crate::types::Sample;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

pub const QUEUE_SIZE: &str = "Queue Size";
pub const CRAWLED: &str = "Crawled";
pub const ERRORS: &str = "Errors";
pub const PERFORMANCE: &str = "Performance";

/// Nomes das séries, na ordem de exibição.
pub const SERIES_NAMES: [&str; 4] = [QUEUE_SIZE, CRAWLED, ERRORS, PERFORMANCE];

/// Rótulo usado quando o timestamp não é representável.
const INVALID_LABEL: &str = "--:--:--";

/// Um ponto do gráfico.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub values: BTreeMap<&'static str, f64>,
}

impl ChartPoint {
    pub fn value(&self, series: &str) -> Option<f64> {
        self.values.get(series).copied()
    }
}

pub type ChartSeries = Vec<ChartPoint>;

/// Projetor determinístico de histórico em [`ChartSeries`].
#[derive(Debug, Clone)]
pub struct ChartProjector {
    time_format: String,
    utc: bool,
}

impl Default for ChartProjector {
    fn default() -> Self {
        Self::new(&ChartConfig::default())
    }
}

impl ChartProjector {
    pub fn new(config: &ChartConfig) -> Self {
        Self {
            time_format: config.time_format.clone(),
            utc: config.utc_labels,
        }
    }

    /// Projeta o histórico inteiro.
    pub fn project(&self, history: &[Sample]) -> ChartSeries {
        history.iter().map(|s| self.point(s)).collect()
    }

    /// Projeta uma única amostra.
    pub fn point(&self, sample: &Sample) -> ChartPoint {
        let values = BTreeMap::from([
            (QUEUE_SIZE, sample.queue_size as f64),
            (CRAWLED, sample.crawled as f64),
            (ERRORS, sample.errors),
            (PERFORMANCE, sample.performance),
        ]);

        ChartPoint {
            label: self.label(sample.timestamp),
            values,
        }
    }

    /// Hora do dia formatada a partir de epoch ms.
    pub fn label(&self, timestamp: u64) -> String {
        let Some(utc) = i64::try_from(timestamp)
            .ok()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
        else {
            return INVALID_LABEL.into();
        };

        let mut label = String::new();
        let written = if self.utc {
            write!(label, "{}", utc.format(&self.time_format))
        } else {
            write!(label, "{}", utc.with_timezone(&Local).format(&self.time_format))
        };

        match written {
            Ok(()) => label,
            Err(_) => INVALID_LABEL.into(),
        }
    }
}
