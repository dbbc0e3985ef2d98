//! # Crawl Metrics Receiver
//!
//! Cliente em tempo real do stream de métricas do crawler: mantém a conexão
//! WebSocket com o produtor, acumula as amostras, dispara alertas e mantém
//! a série pronta para gráfico.
//!
//! ## Módulos
//! - [`connection`] – Ciclo de vida do transporte e decodificação dos frames
//! - [`session`] – Laço consumidor (append → avaliação → projeção → notificação)
//! - [`notify`] – Superfície de notificação dos alertas

pub mod connection;
pub mod notify;
pub mod session;

pub use connection::{ConnectionError, ConnectionState, StreamConnection, StreamEvent};
pub use notify::{NotificationSink, TracingSink};
pub use session::{DashboardView, Session};
