//! Sessão do cliente – laço consumidor único.
//!
//! Cada amostra entregue pela conexão passa, sem intercalação, por
//! append → avaliação → projeção → notificação.

use crate::connection::{ConnectionError, ConnectionState, StreamConnection, StreamEvent};
use crate::notify::NotificationSink;
use crawl_metrics_core::chart::ChartPoint;
use crawl_metrics_core::{
    AlertEvent, AppConfig, ChartProjector, ChartSeries, ConfigurationError, Latest, MetricsStore,
    Sample, ThresholdEvaluator,
};
use std::time::Duration;
use tracing::{debug, info};

/// O que a camada de apresentação consome: sempre disponível, atualizado em bloco.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView<'a> {
    pub latest: Latest,
    pub series: &'a [ChartPoint],
    pub state: ConnectionState,
    /// Erro que encerrou o último ciclo de conexão; `None` em fechamento limpo.
    pub last_error: Option<&'a ConnectionError>,
}

/// Estado da sessão. Dono exclusivo do buffer de amostras.
pub struct Session<N: NotificationSink> {
    config: AppConfig,
    store: MetricsStore,
    evaluator: ThresholdEvaluator,
    projector: ChartProjector,
    series: ChartSeries,
    sink: N,
    connection: Option<StreamConnection>,
    last_error: Option<ConnectionError>,
}

impl<N: NotificationSink> Session<N> {
    pub fn new(config: AppConfig, sink: N) -> Result<Self, ConfigurationError> {
        let config = config.validated()?;

        Ok(Self {
            evaluator: ThresholdEvaluator::new(config.alerts),
            projector: ChartProjector::new(&config.chart),
            config,
            store: MetricsStore::new(),
            series: ChartSeries::new(),
            sink,
            connection: None,
            last_error: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Inicia um novo ciclo de conexão.
    ///
    /// Fecha a conexão anterior e esvazia o histórico, exceto com
    /// `stream.retain_history_on_reconnect`.
    pub fn connect(&mut self) -> Result<(), ConnectionError> {
        if let Some(mut previous) = self.connection.take() {
            previous.close();
        }

        if !self.config.stream.retain_history_on_reconnect && !self.store.is_empty() {
            info!(
                "Novo ciclo de conexão – descartando {} amostras",
                self.store.len()
            );
            self.store.reset();
            self.series.clear();
        }

        self.last_error = None;
        let mut conn = StreamConnection::from_config(&self.config.stream)?;
        let result = conn.open();
        self.connection = Some(conn);
        if let Err(e) = &result {
            self.last_error = Some(e.clone());
        }
        result
    }

    /// Processa uma amostra recebida e retorna os alertas disparados.
    pub fn ingest(&mut self, sample: Sample) -> Vec<AlertEvent> {
        if let Some(previous) = self.store.history().last() {
            if sample.timestamp < previous.timestamp {
                debug!(
                    "Amostra fora de ordem: {} < {}",
                    sample.timestamp, previous.timestamp
                );
            }
        }

        self.store.append(sample);
        let alerts = self.evaluator.evaluate(&sample);
        self.series.push(self.projector.point(&sample));

        debug!(
            "Fila {} | Crawled {} | Erros {} | Desempenho {}%",
            sample.queue_size, sample.crawled, sample.errors, sample.performance
        );
        for alert in &alerts {
            self.sink.notify(alert.kind.level(), &alert.message);
        }

        alerts
    }

    /// Aguarda até `timeout` por eventos e processa todos os pendentes.
    ///
    /// Retorna o número de amostras processadas.
    pub fn pump(&mut self, timeout: Duration) -> usize {
        let mut ingested = 0;
        let mut wait = Some(timeout);

        loop {
            let Some(conn) = self.connection.as_mut() else {
                return ingested;
            };
            match conn.next_event(wait.take()) {
                Some(StreamEvent::Sample(sample)) => {
                    self.ingest(sample);
                    ingested += 1;
                }
                Some(StreamEvent::Closed { error }) => {
                    if error.is_some() {
                        self.last_error = error;
                    }
                    return ingested;
                }
                None => return ingested,
            }
        }
    }

    /// Conecta e processa amostras até a conexão fechar.
    ///
    /// Retorna `Err` quando o transporte caiu em vez de ser fechado pelo produtor.
    pub fn run(&mut self) -> Result<(), ConnectionError> {
        self.connect()?;

        let tick = Duration::from_millis(self.config.stream.read_timeout_ms);
        while self.connection_state() != ConnectionState::Closed {
            self.pump(tick);
        }

        info!("Sessão encerrada com {} amostras", self.store.len());
        match &self.last_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Erro que encerrou o último ciclo de conexão.
    pub fn last_error(&self) -> Option<&ConnectionError> {
        self.last_error.as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection
            .as_ref()
            .map_or(ConnectionState::Closed, StreamConnection::state)
    }

    pub fn latest(&self) -> Latest {
        self.store.latest()
    }

    pub fn history(&self) -> &[Sample] {
        self.store.history()
    }

    pub fn series(&self) -> &[ChartPoint] {
        &self.series
    }

    pub fn view(&self) -> DashboardView<'_> {
        DashboardView {
            latest: self.store.latest(),
            series: &self.series,
            state: self.connection_state(),
            last_error: self.last_error.as_ref(),
        }
    }

    pub fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.close();
        }
    }
}
