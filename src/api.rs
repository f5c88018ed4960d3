use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
  ActiveVotingSession, AdminActivity, AdminMetrics, AuthResponse, ClientError, Issue, IssueQuery,
  IssueUpdate, NewIssue, NewProposal, NewRepository, Proposal, ProposalQuery, ProposalStatus,
  ProposalUpdate, RegisterRequest, Repository, RepositoryUpdate, Result, TokenStore, User,
  UserUpdate, VoteChoice, VoteRequest, VoteResponse,
};

#[derive(Deserialize)]
struct ErrorPayload {
  detail: Option<String>,
}

/// FastAPI error bodies are `{"detail": "..."}`; anything else is surfaced as
/// a detail-less business error.
fn parse_detail(bytes: &[u8]) -> Option<String> {
  serde_json::from_slice::<ErrorPayload>(bytes).ok().and_then(|payload| payload.detail)
}

/// HTTP client for the CivicGit backend. Attaches the bearer credential to
/// every request and applies the global 401 rule: purge stored credentials
/// and fail with [`ClientError::AuthExpired`], overriding any local handling.
#[derive(Clone)]
pub struct Api {
  http: Client,
  base_url: String,
  tokens: TokenStore,
}

impl Api {
  pub fn new(base_url: impl Into<String>, tokens: TokenStore) -> Self {
    let base_url = base_url.into().trim_end_matches('/').to_string();
    Self { http: Client::new(), base_url, tokens }
  }

  pub fn tokens(&self) -> &TokenStore {
    &self.tokens
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.base_url)
  }

  async fn send(&self, request: RequestBuilder) -> Result<Response> {
    let request = match self.tokens.access_token() {
      Some(token) => request.bearer_auth(token),
      None => request,
    };
    let response = request.send().await?;
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
      tracing::warn!("backend answered 401 - purging stored credentials");
      self.tokens.purge();
      return Err(ClientError::AuthExpired);
    }
    if status.is_success() {
      return Ok(response);
    }
    let bytes = response.bytes().await.unwrap_or_default();
    Err(ClientError::Api { status: status.as_u16(), detail: parse_detail(&bytes) })
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&'static str, String)]) -> Result<T> {
    let response = self.send(self.http.get(self.url(path)).query(params)).await?;
    Ok(response.json().await?)
  }

  async fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
    let response = self.send(self.http.post(self.url(path)).json(body)).await?;
    Ok(response.json().await?)
  }

  async fn put_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
    let response = self.send(self.http.put(self.url(path)).json(body)).await?;
    Ok(response.json().await?)
  }

  async fn delete(&self, path: &str) -> Result<()> {
    self.send(self.http.delete(self.url(path))).await.map(|_| ())
  }

  // Auth.

  /// The login endpoint takes form-encoded credentials, not JSON. The
  /// returned tokens are persisted before the response is handed back.
  pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
    let form = [("username", username), ("password", password)];
    let response = self.send(self.http.post(self.url("/v1/auth/login")).form(&form)).await?;
    let auth: AuthResponse = response.json().await?;
    self.tokens.save(&auth)?;
    Ok(auth)
  }

  pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
    let auth: AuthResponse = self.post_json("/v1/auth/register", request).await?;
    self.tokens.save(&auth)?;
    Ok(auth)
  }

  /// Best-effort server-side logout; local credentials are purged regardless.
  pub async fn logout(&self) -> Result<()> {
    let result = self.send(self.http.post(self.url("/v1/auth/logout"))).await;
    self.tokens.purge();
    result.map(|_| ())
  }

  pub async fn current_user(&self) -> Result<User> {
    self.get_json("/v1/auth/me", &[]).await
  }

  pub async fn users(&self) -> Result<Vec<User>> {
    self.get_json("/v1/users", &[]).await
  }

  pub async fn update_profile(&self, update: &UserUpdate) -> Result<User> {
    self.put_json("/v1/users/me", update).await
  }

  pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
    self.put_json(&format!("/v1/users/{id}"), update).await
  }

  /// Admin-side account creation; same payload as self-registration but the
  /// caller's session is kept, not replaced.
  pub async fn create_user(&self, new: &RegisterRequest) -> Result<User> {
    self.post_json("/v1/users", new).await
  }

  pub async fn delete_user(&self, id: i64) -> Result<()> {
    self.delete(&format!("/v1/users/{id}")).await
  }

  // Repositories.

  pub async fn repositories(&self) -> Result<Vec<Repository>> {
    self.get_json("/v1/repositories", &[]).await
  }

  pub async fn repository(&self, id: i64) -> Result<Repository> {
    self.get_json(&format!("/v1/repositories/{id}"), &[]).await
  }

  pub async fn create_repository(&self, new: &NewRepository) -> Result<Repository> {
    self.post_json("/v1/repositories", new).await
  }

  pub async fn update_repository(&self, id: i64, update: &RepositoryUpdate) -> Result<Repository> {
    self.put_json(&format!("/v1/repositories/{id}"), update).await
  }

  pub async fn delete_repository(&self, id: i64) -> Result<()> {
    self.delete(&format!("/v1/repositories/{id}")).await
  }

  // Proposals.

  pub async fn proposals(&self, query: &ProposalQuery) -> Result<Vec<Proposal>> {
    self.get_json("/v1/proposals", &query.to_params()).await
  }

  pub async fn proposal(&self, id: i64) -> Result<Proposal> {
    self.get_json(&format!("/v1/proposals/{id}"), &[]).await
  }

  /// Proposals are created under the repository they amend.
  pub async fn create_proposal(&self, repository_id: i64, new: &NewProposal) -> Result<Proposal> {
    self.post_json(&format!("/v1/repositories/{repository_id}/proposals"), new).await
  }

  pub async fn update_proposal(&self, id: i64, update: &ProposalUpdate) -> Result<Proposal> {
    self.put_json(&format!("/v1/proposals/{id}"), update).await
  }

  pub async fn delete_proposal(&self, id: i64) -> Result<()> {
    self.delete(&format!("/v1/proposals/{id}")).await
  }

  // Voting.

  pub async fn active_voting_sessions(&self) -> Result<Vec<ActiveVotingSession>> {
    self.get_json("/v1/voting/sessions/active", &[]).await
  }

  pub async fn vote(&self, proposal_id: i64, option: VoteChoice) -> Result<VoteResponse> {
    self.post_json(&format!("/v1/votes/proposals/{proposal_id}/vote"), &VoteRequest { option }).await
  }

  // Issues.

  pub async fn issues(&self, query: &IssueQuery) -> Result<Vec<Issue>> {
    self.get_json("/v1/issues", &query.to_params()).await
  }

  pub async fn issue(&self, id: i64) -> Result<Issue> {
    self.get_json(&format!("/v1/issues/{id}"), &[]).await
  }

  pub async fn create_issue(&self, new: &NewIssue) -> Result<Issue> {
    self.post_json("/v1/issues", new).await
  }

  pub async fn update_issue(&self, id: i64, update: &IssueUpdate) -> Result<Issue> {
    self.put_json(&format!("/v1/issues/{id}"), update).await
  }

  pub async fn delete_issue(&self, id: i64) -> Result<()> {
    self.delete(&format!("/v1/issues/{id}")).await
  }

  // Admin. The `/v1/admin` listings bypass the visibility filters the public
  // listings apply, so moderators see archived and private entries too.

  pub async fn admin_metrics(&self) -> Result<AdminMetrics> {
    self.get_json("/v1/admin/metrics", &[]).await
  }

  pub async fn admin_activity(&self) -> Result<AdminActivity> {
    self.get_json("/v1/admin/activity", &[]).await
  }

  pub async fn admin_repositories(&self) -> Result<Vec<Repository>> {
    self.get_json("/v1/admin/repositories", &[]).await
  }

  pub async fn admin_update_repository(&self, id: i64, update: &RepositoryUpdate) -> Result<Repository> {
    self.put_json(&format!("/v1/admin/repositories/{id}"), update).await
  }

  pub async fn admin_proposals(&self) -> Result<Vec<Proposal>> {
    self.get_json("/v1/admin/proposals", &[]).await
  }

  pub async fn admin_update_proposal(&self, id: i64, update: &ProposalUpdate) -> Result<Proposal> {
    self.put_json(&format!("/v1/admin/proposals/{id}"), update).await
  }

  pub async fn admin_issues(&self) -> Result<Vec<Issue>> {
    self.get_json("/v1/admin/issues", &[]).await
  }

  pub async fn admin_update_issue(&self, id: i64, update: &IssueUpdate) -> Result<Issue> {
    self.put_json(&format!("/v1/admin/issues/{id}"), update).await
  }
}

/// The slice of the backend the voting view-model depends on, behind a trait
/// so the view can be exercised without a live server.
#[async_trait]
pub trait VotingBackend {
  async fn active_sessions(&self) -> Result<Vec<ActiveVotingSession>>;
  async fn proposals_by_status(&self, status: ProposalStatus) -> Result<Vec<Proposal>>;
  async fn cast_vote(&self, proposal_id: i64, choice: VoteChoice) -> Result<VoteResponse>;
}

#[async_trait]
impl VotingBackend for Api {
  async fn active_sessions(&self) -> Result<Vec<ActiveVotingSession>> {
    self.active_voting_sessions().await
  }

  async fn proposals_by_status(&self, status: ProposalStatus) -> Result<Vec<Proposal>> {
    self.proposals(&ProposalQuery::status(status)).await
  }

  async fn cast_vote(&self, proposal_id: i64, choice: VoteChoice) -> Result<VoteResponse> {
    self.vote(proposal_id, choice).await
  }
}

/// Canned backend used by view-model tests. Every cast vote is recorded so
/// single-flight behavior can be asserted.
#[derive(Default)]
pub struct MockBackend {
  pub sessions: Vec<ActiveVotingSession>,
  pub preparing: Vec<Proposal>,
  pub sessions_error: Option<u16>,
  pub proposals_error: Option<u16>,
  pub vote_error: Option<(u16, Option<String>)>,
  pub votes_cast: std::sync::Mutex<Vec<(i64, VoteChoice)>>,
  pub status_queries: std::sync::Mutex<Vec<ProposalStatus>>,
}

#[async_trait]
impl VotingBackend for MockBackend {
  async fn active_sessions(&self) -> Result<Vec<ActiveVotingSession>> {
    match self.sessions_error {
      Some(status) => Err(ClientError::Api { status, detail: None }),
      None => Ok(self.sessions.clone()),
    }
  }

  async fn proposals_by_status(&self, status: ProposalStatus) -> Result<Vec<Proposal>> {
    self.status_queries.lock().expect("mock poisoned").push(status);
    match self.proposals_error {
      Some(code) => Err(ClientError::Api { status: code, detail: None }),
      None => Ok(self.preparing.iter().filter(|p| p.status == status).cloned().collect()),
    }
  }

  async fn cast_vote(&self, proposal_id: i64, choice: VoteChoice) -> Result<VoteResponse> {
    if let Some((status, detail)) = &self.vote_error {
      return Err(ClientError::Api { status: *status, detail: detail.clone() });
    }
    self.votes_cast.lock().expect("mock poisoned").push((proposal_id, choice));
    Ok(VoteResponse {
      proposal_id,
      session_id: 1,
      selected_option_id: 1,
      selected_option_value: choice.to_string(),
      total_votes: 1,
      message: "Voto registrado com sucesso.".to_string(),
      voted_at: "2025-03-02T00:00:00".to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn detail_is_taken_from_fastapi_error_bodies() {
    assert_eq!(
      parse_detail(br#"{"detail":"Voce ja registrou seu voto nesta proposta."}"#),
      Some("Voce ja registrou seu voto nesta proposta.".to_string())
    );
    assert_eq!(parse_detail(br#"{"detail":null}"#), None);
    assert_eq!(parse_detail(b"<html>gateway timeout</html>"), None);
    assert_eq!(parse_detail(b""), None);
  }

  #[test]
  fn base_url_trailing_slash_is_normalized() {
    let api = Api::new("http://localhost:8000/api/", TokenStore::fixed("t"));
    assert_eq!(api.url("/v1/proposals"), "http://localhost:8000/api/v1/proposals");
  }

  #[test]
  fn api_error_displays_server_detail_when_present() {
    let with_detail =
      ClientError::Api { status: 400, detail: Some("Esta votacao ja foi encerrada.".to_string()) };
    assert_eq!(with_detail.to_string(), "Esta votacao ja foi encerrada.");

    let without = ClientError::Api { status: 500, detail: None };
    assert_eq!(without.to_string(), "o servidor recusou a operacao");
  }

  /// Serves exactly one connection with a canned response and hands back the
  /// raw request bytes for assertions.
  fn one_shot_server(response: &'static str) -> (std::net::SocketAddr, std::thread::JoinHandle<String>) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
      use std::io::{Read, Write};
      let (mut stream, _) = listener.accept().unwrap();
      let mut buf = [0u8; 4096];
      let read = stream.read(&mut buf).unwrap_or(0);
      stream.write_all(response.as_bytes()).unwrap();
      String::from_utf8_lossy(&buf[.. read]).into_owned()
    });
    (addr, handle)
  }

  #[tokio::test]
  async fn a_401_purges_stored_credentials_and_maps_to_auth_expired() {
    let (addr, server) = one_shot_server(
      "HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
    );
    let api = Api::new(format!("http://{addr}"), TokenStore::fixed("stale-token"));

    let result = api.current_user().await;

    assert!(matches!(result, Err(ClientError::AuthExpired)));
    assert_eq!(api.tokens().access_token(), None);
    let request = server.join().unwrap();
    assert!(request.to_lowercase().contains("authorization: bearer stale-token"));
  }

  #[tokio::test]
  async fn delete_operations_send_the_verb_and_path() {
    let (addr, server) =
      one_shot_server("HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n");
    let api = Api::new(format!("http://{addr}"), TokenStore::fixed("t"));

    api.delete_issue(7).await.unwrap();

    let request = server.join().unwrap();
    assert!(request.starts_with("DELETE /v1/issues/7 "), "unexpected request line: {request}");
  }

  #[tokio::test]
  async fn mock_backend_filters_by_status_and_records_votes() {
    use crate::ProposalStatus::{AwaitingReview, Discussion};
    let mut backend = MockBackend::default();
    backend.preparing = vec![
      crate::proposal_fixture(1, "A", Discussion),
      crate::proposal_fixture(2, "B", AwaitingReview),
    ];

    let discussion = backend.proposals_by_status(Discussion).await.unwrap();
    assert_eq!(discussion.len(), 1);
    assert_eq!(discussion[0].id, 1);

    backend.cast_vote(2, VoteChoice::No).await.unwrap();
    assert_eq!(*backend.votes_cast.lock().unwrap(), vec![(2, VoteChoice::No)]);
  }
}
