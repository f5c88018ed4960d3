use std::path::PathBuf;

use clap::Args;

use crate::{Api, TokenStore};

#[derive(Clone, Args)]
pub struct ClientConfig {
  /// Base URL of the CivicGit API.
  #[clap(long, env = "CIVICGIT_API_URL", default_value = "http://localhost:8000/api")]
  pub api_url: String,
  /// Bearer token override. When set, the credentials file is never touched.
  #[clap(long, env = "CIVICGIT_TOKEN")]
  pub token: Option<String>,
  /// Where the session token is persisted between invocations.
  #[clap(long, env = "CIVICGIT_CREDENTIALS")]
  pub credentials_path: Option<PathBuf>,
}

impl ClientConfig {
  pub fn to_api(&self) -> Api {
    Api::new(&self.api_url, self.token_store())
  }

  pub fn token_store(&self) -> TokenStore {
    match &self.token {
      Some(token) => TokenStore::fixed(token),
      None => TokenStore::open(self.credentials_file()),
    }
  }

  fn credentials_file(&self) -> PathBuf {
    self.credentials_path.clone().unwrap_or_else(|| {
      std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".civicgit")
        .join("credentials.json")
    })
  }
}
