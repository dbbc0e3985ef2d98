//! Definição dos tipos de dados das métricas do crawler.
//!
//! O produtor (plugin de métricas do crawler) envia um registro plano por
//! frame; os nomes de campo no fio seguem o `camelCase` do produtor.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Amostra
// ──────────────────────────────────────────────

/// Uma leitura de métricas do pipeline de crawl.
///
/// Imutável depois de construída. O timestamp vem sempre do produtor;
/// a única exceção é o placeholder de [`Sample::no_data`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// URLs aguardando na fila
    #[serde(deserialize_with = "counter")]
    pub queue_size: u64,
    /// Total de páginas processadas
    #[serde(deserialize_with = "counter")]
    pub crawled: u64,
    /// Taxa (ou contagem) de erros
    pub errors: f64,
    /// Score de desempenho (0–100 por convenção)
    pub performance: f64,
    /// Epoch em milissegundos, atribuído pelo produtor
    #[serde(deserialize_with = "counter")]
    pub timestamp: u64,
}

/// Inteiro não negativo vindo de qualquer número JSON.
///
/// Aceita `3` e `3.0`; recusa negativos, frações e valores fora de `u64`.
fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    deserializer.deserialize_any(CounterVisitor)
}

struct CounterVisitor;

impl<'de> Visitor<'de> for CounterVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("um inteiro não negativo")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<u64, E> {
        // 2^64 como f64; o limite superior é exclusivo
        if v >= 0.0 && v.fract() == 0.0 && v < 18_446_744_073_709_551_616.0 {
            Ok(v as u64)
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

impl Sample {
    /// Placeholder otimista exibido antes da primeira amostra.
    ///
    /// Não é dado medido: fila vazia, zero erros e desempenho 100.
    pub fn no_data(timestamp: u64) -> Self {
        Self {
            queue_size: 0,
            crawled: 0,
            errors: 0.0,
            performance: 100.0,
            timestamp,
        }
    }
}

// ──────────────────────────────────────────────
// Última leitura
// ──────────────────────────────────────────────

/// Resultado de [`crate::MetricsStore::latest`].
///
/// Separa "nenhum dado ainda" de "medido como zero".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latest {
    /// Nenhuma amostra recebida; carrega o placeholder de [`Sample::no_data`].
    Unset(Sample),
    /// Última amostra realmente recebida.
    Measured(Sample),
}

impl Latest {
    pub fn sample(&self) -> &Sample {
        match self {
            Latest::Unset(s) | Latest::Measured(s) => s,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, Latest::Measured(_))
    }
}

/// Epoch atual em milissegundos.
pub fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_placeholder_is_optimistic() {
        let p = Sample::no_data(42);
        assert_eq!(p.queue_size, 0);
        assert_eq!(p.crawled, 0);
        assert_eq!(p.errors, 0.0);
        assert_eq!(p.performance, 100.0);
        assert_eq!(p.timestamp, 42);
    }

    #[test]
    fn unset_and_measured_zero_are_distinct() {
        let zero = Sample {
            performance: 100.0,
            timestamp: 7,
            ..Default::default()
        };
        let unset = Latest::Unset(Sample::no_data(7));
        let measured = Latest::Measured(zero);

        assert_eq!(unset.sample(), measured.sample());
        assert_ne!(unset, measured);
        assert!(!unset.is_measured());
        assert!(measured.is_measured());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let sample = Sample {
            queue_size: 3,
            crawled: 10,
            errors: 7.0,
            performance: 40.0,
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(sample).unwrap();
        assert_eq!(json["queueSize"], 3);
        assert_eq!(json["crawled"], 10);
        assert_eq!(json["timestamp"], 1_700_000_000_000u64);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_millis() > 1_577_836_800_000);
    }
}
