use thiserror::Error;

pub type Result<T, E = ClientError> = std::result::Result<T, E>;

/// Failure taxonomy of the client: transport, server-reported business error,
/// and credential expiry. Business errors carry the backend's `detail` string
/// when one was provided.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("{}", detail.as_deref().unwrap_or("o servidor recusou a operacao"))]
  Api { status: u16, detail: Option<String> },

  /// The backend answered 401. Stored credentials were already purged by the
  /// time this is observed.
  #[error("sessao expirada - faca login novamente")]
  AuthExpired,

  #[error("nenhuma credencial armazenada - faca login primeiro")]
  MissingCredentials,

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

impl ClientError {
  /// Server-provided human-readable message, if any.
  pub fn detail(&self) -> Option<&str> {
    match self {
      ClientError::Api { detail, .. } => detail.as_deref(),
      _ => None,
    }
  }
}
