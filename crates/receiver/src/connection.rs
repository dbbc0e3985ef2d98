//! Conexão WebSocket com o produtor de métricas.
//!
//! Uma thread de rede lê os frames, decodifica amostras e as envia via
//! channel. Os handlers rodam sempre na thread que chama [`StreamConnection::poll`]
//! ou [`StreamConnection::wait`], nunca na thread de rede.

use crawl_metrics_core::Sample;
use crawl_metrics_core::config::{StreamConfig, parse_endpoint};
use crawl_metrics_core::protocol::decode_sample;
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;
type SampleHandler = Box<dyn FnMut(Sample)>;
type ErrorHandler = Box<dyn FnMut(&ConnectionError)>;

/// Estado do ciclo de vida da conexão.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Erros de conexão. Reportados ao chamador, nunca re-tentados aqui.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("{0}")]
    InvalidEndpoint(String),

    #[error("Falha ao conectar em {endpoint}: {reason}")]
    Handshake { endpoint: String, reason: String },

    #[error("Conexão já está aberta")]
    AlreadyOpen,

    #[error("Conexão interrompida: {0}")]
    Severed(String),
}

/// Evento entregue pela thread de rede.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Sample(Sample),
    /// Fim do transporte. `error` é `None` quando o produtor fechou normalmente.
    Closed { error: Option<ConnectionError> },
}

/// Conexão única e persistente com o endpoint de push do produtor.
pub struct StreamConnection {
    endpoint: String,
    read_timeout: Duration,
    state: ConnectionState,
    events: Option<Receiver<StreamEvent>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    sample_handlers: Vec<SampleHandler>,
    error_handlers: Vec<ErrorHandler>,
}

impl StreamConnection {
    /// Prepara uma conexão em `Connecting`. Nada é aberto até [`Self::open`].
    pub fn new(endpoint: &str, read_timeout: Duration) -> Result<Self, ConnectionError> {
        let url = parse_endpoint(endpoint).map_err(ConnectionError::InvalidEndpoint)?;

        Ok(Self {
            endpoint: url.to_string(),
            read_timeout,
            state: ConnectionState::Connecting,
            events: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
            sample_handlers: Vec::new(),
            error_handlers: Vec::new(),
        })
    }

    pub fn from_config(config: &StreamConfig) -> Result<Self, ConnectionError> {
        Self::new(
            &config.endpoint,
            Duration::from_millis(config.read_timeout_ms),
        )
    }

    /// `new` + `open`.
    pub fn connect(endpoint: &str, read_timeout: Duration) -> Result<Self, ConnectionError> {
        let mut conn = Self::new(endpoint, read_timeout)?;
        conn.open()?;
        Ok(conn)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Registra um handler chamado uma vez por amostra, em ordem de chegada.
    pub fn on_sample(&mut self, handler: impl FnMut(Sample) + 'static) {
        self.sample_handlers.push(Box::new(handler));
    }

    /// Registra um handler para erros de conexão (cada erro é entregue uma vez).
    pub fn on_error(&mut self, handler: impl FnMut(&ConnectionError) + 'static) {
        self.error_handlers.push(Box::new(handler));
    }

    /// Abre o transporte: `Connecting` → `Open`, ou `Closed` em caso de falha.
    ///
    /// A partir de `Closed` reinicia em `Connecting`; amostras do ciclo
    /// anterior que não foram consumidas são descartadas.
    pub fn open(&mut self) -> Result<(), ConnectionError> {
        if self.state == ConnectionState::Open {
            return Err(ConnectionError::AlreadyOpen);
        }
        self.stop_worker();
        self.events = None;
        self.state = ConnectionState::Connecting;
        info!("Conectando a {}", self.endpoint);

        match self.spawn_reader() {
            Ok(()) => {
                self.state = ConnectionState::Open;
                info!("Conectado a {}", self.endpoint);
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Closed;
                warn!("{e}");
                self.report(&e);
                Err(e)
            }
        }
    }

    fn spawn_reader(&mut self) -> Result<(), ConnectionError> {
        let fail = |reason: String| ConnectionError::Handshake {
            endpoint: self.endpoint.clone(),
            reason,
        };

        let (mut ws, _response) =
            tungstenite::connect(self.endpoint.as_str()).map_err(|e| fail(e.to_string()))?;

        // Sem timeout a thread ficaria presa no read e o close() não retornaria
        match ws.get_mut() {
            MaybeTlsStream::Plain(stream) => stream
                .set_read_timeout(Some(self.read_timeout))
                .map_err(|e| fail(e.to_string()))?,
            _ => return Err(fail("stream TLS não suportado".into())),
        }

        let (tx, rx) = unbounded::<StreamEvent>();
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);

        let worker = std::thread::Builder::new()
            .name("ws-reader".into())
            .spawn(move || reader_loop(ws, &tx, &flag))
            .map_err(|e| fail(e.to_string()))?;

        self.shutdown = shutdown;
        self.worker = Some(worker);
        self.events = Some(rx);
        Ok(())
    }

    /// Próximo evento pendente, aplicando a transição para `Closed`.
    ///
    /// `None` como timeout não bloqueia. Não chama os handlers de amostra.
    pub fn next_event(&mut self, timeout: Option<Duration>) -> Option<StreamEvent> {
        let received = {
            let rx = self.events.as_ref()?;
            match timeout {
                Some(t) => rx.recv_timeout(t).map_err(|e| e.is_disconnected()),
                None => rx.try_recv().map_err(|e| e.is_disconnected()),
            }
        };

        let event = match received {
            Ok(event) => event,
            Err(false) => return None,
            Err(true) => StreamEvent::Closed {
                error: Some(ConnectionError::Severed(
                    "thread de rede encerrada sem aviso".into(),
                )),
            },
        };

        if let StreamEvent::Closed { error } = &event {
            self.mark_closed(error.as_ref());
        }
        Some(event)
    }

    /// Despacha todos os eventos pendentes sem bloquear. Retorna o número de amostras.
    pub fn poll(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(event) = self.next_event(None) {
            delivered += self.dispatch(event);
        }
        delivered
    }

    /// Aguarda até `timeout` pelo primeiro evento e despacha os pendentes.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        match self.next_event(Some(timeout)) {
            Some(event) => self.dispatch(event) + self.poll(),
            None => 0,
        }
    }

    fn dispatch(&mut self, event: StreamEvent) -> usize {
        match event {
            StreamEvent::Sample(sample) => {
                for handler in &mut self.sample_handlers {
                    handler(sample);
                }
                1
            }
            StreamEvent::Closed { .. } => 0,
        }
    }

    fn mark_closed(&mut self, error: Option<&ConnectionError>) {
        self.state = ConnectionState::Closed;
        self.events = None;
        self.stop_worker();

        match error {
            Some(e) => {
                warn!("{e}");
                self.report(e);
            }
            None => info!("Conexão com {} encerrada pelo produtor", self.endpoint),
        }
    }

    fn report(&mut self, error: &ConnectionError) {
        for handler in &mut self.error_handlers {
            handler(error);
        }
    }

    /// Encerra a conexão. Nenhum handler é chamado depois que retorna.
    pub fn close(&mut self) {
        if self.worker.is_some() {
            info!("Fechando conexão com {}", self.endpoint);
        }
        self.stop_worker();
        self.events = None;
        self.state = ConnectionState::Closed;
    }

    fn stop_worker(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Thread de rede terminou com pânico");
            }
        }
    }
}

impl Drop for StreamConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn reader_loop(mut ws: Socket, tx: &Sender<StreamEvent>, shutdown: &AtomicBool) {
    let error = loop {
        if shutdown.load(Ordering::Acquire) {
            let _ = ws.close(None);
            let _ = ws.flush();
            debug!("Thread de rede encerrada a pedido");
            return;
        }

        match ws.read() {
            Ok(Message::Text(text)) => match decode_sample(&text) {
                Ok(sample) => {
                    if tx.send(StreamEvent::Sample(sample)).is_err() {
                        // Consumidor descartou o receiver
                        return;
                    }
                }
                Err(e) => warn!("Frame descartado: {e}"),
            },
            Ok(Message::Binary(bytes)) => {
                debug!("Frame binário descartado ({} bytes)", bytes.len());
            }
            Ok(Message::Close(frame)) => {
                let _ = ws.flush();
                debug!("Close recebido: {frame:?}");
                break None;
            }
            Ok(_) => {} // ping/pong
            Err(tungstenite::Error::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                // Timeout normal, checa shutdown
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                break None;
            }
            Err(e) => break Some(ConnectionError::Severed(e.to_string())),
        }
    };

    let _ = tx.send(StreamEvent::Closed { error });
}
