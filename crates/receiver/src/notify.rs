//! Superfície de notificação: recebe mensagens de alerta já formatadas.

use crawl_metrics_core::AlertLevel;
use tracing::{error, warn};

/// Destino fire-and-forget das mensagens de alerta.
pub trait NotificationSink {
    fn notify(&mut self, level: AlertLevel, message: &str);
}

/// Sink padrão do binário: alertas críticos como `error!`, avisos como `warn!`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&mut self, level: AlertLevel, message: &str) {
        match level {
            AlertLevel::Critical => error!(target: "alerts", "{message}"),
            AlertLevel::Warning => warn!(target: "alerts", "{message}"),
        }
    }
}
