//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável com as seções
//! `[stream]`, `[alerts]` e `[chart]`.

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;
use url::Url;

/// Endpoint padrão do plugin de métricas em tempo real.
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:3001/ws/metrics";

/// Erros de configuração. Falham cedo, antes de abrir qualquer conexão.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Configuração inválida: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao parsear {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Erro de E/S em {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Configuração da conexão com o produtor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// URI do endpoint WebSocket (`ws://`; TLS não é suportado)
    pub endpoint: String,
    /// Timeout de leitura da thread de rede (ms); limita a latência do `close()`
    pub read_timeout_ms: u64,
    /// Mantém o histórico ao reconectar em vez de esvaziá-lo
    pub retain_history_on_reconnect: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            read_timeout_ms: 100,
            retain_history_on_reconnect: false,
        }
    }
}

/// Thresholds de alerta.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertThresholds {
    /// Alerta quando `errors` fica estritamente acima
    pub error_threshold: f64,
    /// Alerta quando `performance` fica estritamente abaixo
    pub performance_threshold: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            error_threshold: 5.0,
            performance_threshold: 50.0,
        }
    }
}

/// Configuração dos rótulos do gráfico.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Padrão strftime do rótulo de hora
    pub time_format: String,
    /// Rótulos em UTC em vez do fuso local
    pub utc_labels: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            time_format: "%H:%M:%S".into(),
            utc_labels: false,
        }
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stream: StreamConfig,
    pub alerts: AlertThresholds,
    pub chart: ChartConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    ///
    /// Só o arquivo ausente cai nos valores padrão; arquivo ilegível ou
    /// malformado é erro, para nunca rodar com thresholds que o operador
    /// não definiu.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        if !path.exists() {
            info!("{} não encontrado, usando configuração padrão", path.display());
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str::<AppConfig>(&content).map_err(|source| {
            ConfigurationError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;

        info!("Configuração carregada de {}", path.display());
        Ok(config)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigurationError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if let Err(e) = parse_endpoint(&self.stream.endpoint) {
            errors.push(e);
        }
        if !(10..=10_000).contains(&self.stream.read_timeout_ms) {
            errors.push(format!(
                "Timeout de leitura inválido: {}ms (10–10000)",
                self.stream.read_timeout_ms
            ));
        }
        if !self.alerts.error_threshold.is_finite() {
            errors.push(format!(
                "Threshold de erros inválido: {}",
                self.alerts.error_threshold
            ));
        }
        if !self.alerts.performance_threshold.is_finite() {
            errors.push(format!(
                "Threshold de desempenho inválido: {}",
                self.alerts.performance_threshold
            ));
        }
        if !is_valid_time_format(&self.chart.time_format) {
            errors.push(format!(
                "Formato de hora inválido: {:?}",
                self.chart.time_format
            ));
        }

        errors
    }

    /// Versão fail-fast de [`AppConfig::validate`].
    pub fn validated(self) -> Result<Self, ConfigurationError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigurationError::Invalid(errors))
        }
    }
}

/// Interpreta o endpoint do produtor. Aceita apenas `ws` com host.
///
/// `wss` é recusado: o cliente WebSocket é compilado sem TLS.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, String> {
    let url = Url::parse(endpoint).map_err(|e| format!("Endpoint inválido {endpoint:?}: {e}"))?;
    if url.scheme() != "ws" {
        return Err(format!(
            "Esquema não suportado em {endpoint:?}: {} (esperado ws)",
            url.scheme()
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(format!("Endpoint sem host: {endpoint:?}"));
    }
    Ok(url)
}

fn is_valid_time_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.stream.endpoint, parsed.stream.endpoint);
        assert_eq!(config.alerts, parsed.alerts);
        assert_eq!(config.chart.time_format, parsed.chart.time_format);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[alerts]
error_threshold = 10.0
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.alerts.error_threshold, 10.0);
        // Outros campos devem ter valor padrão
        assert_eq!(config.alerts.performance_threshold, 50.0);
        assert_eq!(config.stream.endpoint, DEFAULT_ENDPOINT);
        assert!(!config.stream.retain_history_on_reconnect);
    }

    #[test]
    fn malformed_endpoint_fails_fast() {
        let mut config = AppConfig::default();
        config.stream.endpoint = "localhost 3001".into();
        assert!(matches!(
            config.validated(),
            Err(ConfigurationError::Invalid(errors)) if errors.len() == 1
        ));
    }

    #[test]
    fn only_plain_ws_scheme_is_accepted() {
        assert!(parse_endpoint("http://localhost:3001/ws/metrics").is_err());
        assert!(parse_endpoint("wss://metrics.example.com/ws/metrics").is_err());
        assert!(parse_endpoint("ws://metrics.example.com/ws/metrics").is_ok());
    }

    #[test]
    fn wss_endpoint_fails_validation() {
        let mut config = AppConfig::default();
        config.stream.endpoint = "wss://127.0.0.1:1/ws".into();
        assert!(matches!(
            config.validated(),
            Err(ConfigurationError::Invalid(_))
        ));
    }

    #[test]
    fn non_finite_thresholds_are_rejected() {
        let mut config = AppConfig::default();
        config.alerts.error_threshold = f64::NAN;
        config.alerts.performance_threshold = f64::INFINITY;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn bad_time_format_is_rejected() {
        let mut config = AppConfig::default();
        config.chart.time_format = "%Q".into();
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = AppConfig::default();
        config.stream.endpoint = "ws://10.0.0.5:3001/ws/metrics".into();
        config.stream.retain_history_on_reconnect = true;
        config.save(&path).unwrap();

        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded.stream.endpoint, "ws://10.0.0.5:3001/ws/metrics");
        assert!(loaded.stream.retain_history_on_reconnect);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(loaded.stream.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(loaded.alerts, AlertThresholds::default());
    }

    #[test]
    fn malformed_threshold_in_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[alerts]\nerror_threshold = \"abc\"\n").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[stream\nendpoint = ").unwrap();

        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigurationError::Parse { .. })
        ));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // Um diretório existe mas não pode ser lido como arquivo
        assert!(matches!(
            AppConfig::load(dir.path()),
            Err(ConfigurationError::Io { .. })
        ));
    }
}
