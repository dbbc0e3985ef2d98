//! Protocolo de comunicação com o produtor de métricas.
//!
//! Cada frame de texto do WebSocket carrega uma amostra completa como
//! registro JSON plano:
//!
//! ```text
//! {"queueSize":3,"crawled":10,"errors":7,"performance":40,"timestamp":1700000000000}
//! ```
//!
//! - Campos numéricos como números JSON, `timestamp` em epoch ms
//! - Contadores aceitam qualquer número JSON inteiro (`3` ou `3.0`)
//! - Campos extras são ignorados; campo ausente ou de tipo errado invalida o frame

use crate::types::Sample;

/// Tamanho máximo aceito para um frame de amostra.
/// Uma amostra real tem menos de 200 bytes.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Erros de decodificação de um frame.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Frame vazio")]
    Empty,

    #[error("Frame muito grande ({0} bytes, máximo {MAX_FRAME_SIZE})")]
    TooLarge(usize),

    #[error("Amostra malformada: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Decodifica um frame de texto em [`Sample`].
pub fn decode_sample(frame: &str) -> Result<Sample, DecodeError> {
    let frame = frame.trim();
    if frame.is_empty() {
        return Err(DecodeError::Empty);
    }
    if frame.len() > MAX_FRAME_SIZE {
        return Err(DecodeError::TooLarge(frame.len()));
    }

    Ok(serde_json::from_str(frame)?)
}

/// Codifica uma [`Sample`] no formato do produtor.
pub fn encode_sample(sample: &Sample) -> Result<String, serde_json::Error> {
    serde_json::to_string(sample)
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
