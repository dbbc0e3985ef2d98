//! Sistema de alertas – níveis e avaliação de thresholds.
//!
//! Avaliação pura e sem estado: cada amostra que viola um threshold gera
//! alerta novamente, sem debounce entre amostras consecutivas.

use crate::config::AlertThresholds;
use crate::types::Sample;
use serde::{Deserialize, Serialize};

/// Nível de alerta, usado pela superfície de notificação.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Warning,
    Critical,
}

/// Regra violada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    ErrorRateHigh,
    PerformanceLow,
}

impl AlertKind {
    pub fn level(self) -> AlertLevel {
        match self {
            AlertKind::ErrorRateHigh => AlertLevel::Critical,
            AlertKind::PerformanceLow => AlertLevel::Warning,
        }
    }
}

/// Um alerta disparado. Transitório: entregue uma vez, nunca armazenado.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub kind: AlertKind,
    pub message: String,
    pub sample: Sample,
}

/// Avaliador de thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdEvaluator {
    thresholds: AlertThresholds,
}

impl ThresholdEvaluator {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn evaluate(&self, sample: &Sample) -> Vec<AlertEvent> {
        evaluate_alerts(sample, &self.thresholds)
    }
}

/// Avalia uma amostra contra os thresholds e retorna alertas.
///
/// As duas regras são independentes e podem disparar juntas. Ambas as
/// comparações são estritas: valor igual ao threshold não alerta.
pub fn evaluate_alerts(sample: &Sample, thresholds: &AlertThresholds) -> Vec<AlertEvent> {
    let mut alerts = Vec::new();

    if sample.errors > thresholds.error_threshold {
        alerts.push(AlertEvent {
            kind: AlertKind::ErrorRateHigh,
            message: format!("Error rate spiked to {}%!", sample.errors),
            sample: *sample,
        });
    }

    if sample.performance < thresholds.performance_threshold {
        alerts.push(AlertEvent {
            kind: AlertKind::PerformanceLow,
            message: format!("Performance dipped to {}%!", sample.performance),
            sample: *sample,
        });
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(errors: f64, performance: f64) -> Sample {
        Sample {
            queue_size: 3,
            crawled: 10,
            errors,
            performance,
            timestamp: 1_700_000_000_000,
        }
    }

    fn kinds(alerts: &[AlertEvent]) -> Vec<AlertKind> {
        alerts.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn no_alerts_for_normal_values() {
        let alerts = evaluate_alerts(&sample(1.0, 90.0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn errors_above_threshold_alert() {
        let alerts = evaluate_alerts(&sample(6.0, 90.0), &AlertThresholds::default());
        assert_eq!(kinds(&alerts), vec![AlertKind::ErrorRateHigh]);
        assert_eq!(alerts[0].message, "Error rate spiked to 6%!");
        assert_eq!(alerts[0].kind.level(), AlertLevel::Critical);
    }

    #[test]
    fn errors_at_threshold_do_not_alert() {
        let alerts = evaluate_alerts(&sample(5.0, 90.0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn performance_below_threshold_alerts() {
        let alerts = evaluate_alerts(&sample(0.0, 49.0), &AlertThresholds::default());
        assert_eq!(kinds(&alerts), vec![AlertKind::PerformanceLow]);
        assert_eq!(alerts[0].message, "Performance dipped to 49%!");
        assert_eq!(alerts[0].kind.level(), AlertLevel::Warning);
    }

    #[test]
    fn performance_at_threshold_does_not_alert() {
        let alerts = evaluate_alerts(&sample(0.0, 50.0), &AlertThresholds::default());
        assert!(alerts.is_empty());
    }

    #[test]
    fn both_rules_fire_independently() {
        let s = sample(7.0, 40.0);
        let alerts = ThresholdEvaluator::default().evaluate(&s);
        assert_eq!(
            kinds(&alerts),
            vec![AlertKind::ErrorRateHigh, AlertKind::PerformanceLow]
        );
        assert!(alerts.iter().all(|a| a.sample == s));
    }

    #[test]
    fn repeated_breach_realerts_every_time() {
        let evaluator = ThresholdEvaluator::default();
        let s = sample(9.5, 90.0);
        assert_eq!(evaluator.evaluate(&s).len(), 1);
        assert_eq!(evaluator.evaluate(&s).len(), 1);
        assert_eq!(evaluator.evaluate(&s)[0].message, "Error rate spiked to 9.5%!");
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let evaluator = ThresholdEvaluator::new(AlertThresholds {
            error_threshold: 0.0,
            performance_threshold: 95.0,
        });
        assert_eq!(evaluator.evaluate(&sample(0.5, 94.0)).len(), 2);
        assert!(evaluator.evaluate(&sample(0.0, 95.0)).is_empty());
    }
}
