//! Buffer de amostras recebidas na sessão.

use crate::types::{now_millis, Latest, Sample};

/// Sequência de amostras em ordem de chegada.
///
/// Não reordena por timestamp nem remove duplicatas: o transporte pode
/// entregar fora de ordem e o buffer registra exatamente o que chegou.
#[derive(Debug, Clone, Default)]
pub struct MetricsStore {
    samples: Vec<Sample>,
}

impl MetricsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anexa uma amostra. O(1) amortizado.
    pub fn append(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Última amostra, ou o placeholder [`Latest::Unset`] antes da primeira.
    pub fn latest(&self) -> Latest {
        match self.samples.last() {
            Some(sample) => Latest::Measured(*sample),
            None => Latest::Unset(Sample::no_data(now_millis())),
        }
    }

    /// Histórico completo, em ordem de chegada.
    pub fn history(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Esvazia o buffer para um novo ciclo de conexão.
    pub fn reset(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: u64) -> Sample {
        Sample {
            queue_size: ts % 50,
            crawled: ts,
            errors: 1.0,
            performance: 90.0,
            timestamp: ts,
        }
    }

    #[test]
    fn empty_store_reports_placeholder() {
        let before = now_millis();
        let store = MetricsStore::new();
        let latest = store.latest();

        assert!(store.history().is_empty());
        assert!(!latest.is_measured());
        let p = latest.sample();
        assert_eq!((p.queue_size, p.crawled), (0, 0));
        assert_eq!(p.errors, 0.0);
        assert_eq!(p.performance, 100.0);
        assert!(p.timestamp >= before);
    }

    #[test]
    fn history_grows_by_one_per_append() {
        let mut store = MetricsStore::new();
        for i in 1..=5 {
            store.append(sample(i));
            assert_eq!(store.history().len(), i as usize);
            assert_eq!(store.latest(), Latest::Measured(*store.history().last().unwrap()));
        }
    }

    #[test]
    fn out_of_order_delivery_is_kept_as_received() {
        let mut store = MetricsStore::new();
        store.append(sample(30));
        store.append(sample(10));
        store.append(sample(20));
        store.append(sample(20));

        let ts: Vec<u64> = store.history().iter().map(|s| s.timestamp).collect();
        assert_eq!(ts, vec![30, 10, 20, 20]);
        assert_eq!(store.latest().sample().timestamp, 20);
    }

    #[test]
    fn reset_returns_to_placeholder() {
        let mut store = MetricsStore::new();
        store.append(sample(1));
        store.reset();
        assert!(store.is_empty());
        assert!(!store.latest().is_measured());
    }
}
