use std::collections::HashMap;

use crate::{ActiveVotingSession, Proposal, VotingBackend, Wrapper, PREPARING_STATUSES};

/// Active sessions keyed by proposal id, iteration in fetch order. All
/// mutation is replace-by-identity; nothing here touches positional indices,
/// so a patch lands on the right session even if ordering drifted since the
/// fetch.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
  order: Vec<i64>,
  by_id: HashMap<i64, ActiveVotingSession>,
}

impl SessionStore {
  pub fn replace_all(&mut self, sessions: Vec<ActiveVotingSession>) {
    self.order.clear();
    self.by_id.clear();
    for session in sessions {
      self.upsert(session);
    }
  }

  pub fn upsert(&mut self, session: ActiveVotingSession) {
    let id = session.proposal_id;
    if self.by_id.insert(id, session).is_none() {
      self.order.push(id);
    }
  }

  pub fn get(&self, proposal_id: i64) -> Option<&ActiveVotingSession> {
    self.by_id.get(&proposal_id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &ActiveVotingSession> {
    self.order.iter().filter_map(|id| self.by_id.get(id))
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }
}

/// View state behind the voting page: the active sessions, the proposals
/// still gathering signatures or review, and one loading flag per collection
/// so either rail can render before the other finishes.
#[derive(Default)]
pub struct VotingBoard {
  pub sessions: SessionStore,
  pub preparing: Vec<Proposal>,
  pub loading_sessions: bool,
  pub loading_preparing: bool,
}

impl VotingBoard {
  pub fn new() -> Self {
    Self { loading_sessions: true, loading_preparing: true, ..Self::default() }
  }

  /// Refreshes both collections concurrently. Each fetch fails independently:
  /// an error is logged and leaves that collection as it was, never blocking
  /// the other one.
  pub async fn load<B: VotingBackend + Sync>(&mut self, backend: &B) {
    self.loading_sessions = true;
    self.loading_preparing = true;
    let (sessions, preparing) =
      tokio::join!(Self::fetch_sessions(backend), Self::fetch_preparing(backend));
    if let Some(sessions) = sessions {
      self.sessions.replace_all(sessions);
    }
    self.loading_sessions = false;
    if let Some(preparing) = preparing {
      self.preparing = preparing;
    }
    self.loading_preparing = false;
  }

  async fn fetch_sessions<B: VotingBackend + Sync>(backend: &B) -> Option<Vec<ActiveVotingSession>> {
    match backend.active_sessions().await {
      Ok(sessions) => Some(sessions),
      Err(error) => {
        tracing::error!(%error, "failed to load active voting sessions");
        None
      }
    }
  }

  /// Fans out one request per pre-voting status and merges the results by
  /// proposal id, since a proposal can match more than one status filter.
  async fn fetch_preparing<B: VotingBackend + Sync>(backend: &B) -> Option<Vec<Proposal>> {
    let [a, b, c] = PREPARING_STATUSES;
    let results = tokio::join!(
      backend.proposals_by_status(a),
      backend.proposals_by_status(b),
      backend.proposals_by_status(c),
    );
    let batches = match results {
      (Ok(a), Ok(b), Ok(c)) => [a, b, c],
      (a, b, c) => {
        if let Some(error) = [a.err(), b.err(), c.err()].into_iter().flatten().next() {
          tracing::error!(%error, "failed to load preparing proposals");
        }
        return None;
      }
    };
    Some(Wrapper(batches.into_iter().flatten().collect::<Vec<_>>()).merge_by_id().0)
  }

  /// Applies an acknowledged vote to the stored session, returning the
  /// patched snapshot. No-op when the session is unknown.
  pub fn apply_vote(&mut self, proposal_id: i64, choice: crate::VoteChoice) -> Option<ActiveVotingSession> {
    let updated = self.sessions.get(proposal_id)?.record_vote(choice);
    self.sessions.upsert(updated.clone());
    Some(updated)
  }

  pub fn filter_sessions(&self, query: &str) -> Vec<&ActiveVotingSession> {
    self.sessions.iter().filter(|session| session.matches(query)).collect()
  }

  pub fn filter_preparing(&self, query: &str) -> Vec<&Proposal> {
    self.preparing.iter().filter(|proposal| proposal.matches(query)).collect()
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    proposal_fixture, session_fixture, MockBackend, ProposalStatus, VoteChoice, VotingStats,
  };

  use super::*;

  #[test]
  fn store_replaces_by_identity_not_position() {
    let mut store = SessionStore::default();
    store.replace_all(vec![session_fixture(3, "C"), session_fixture(1, "A"), session_fixture(2, "B")]);

    let mut patched = session_fixture(1, "A");
    patched.stats.total_votes = 99;
    store.upsert(patched);

    assert_eq!(store.len(), 3);
    assert_eq!(store.iter().map(|s| s.proposal_id).collect::<Vec<_>>(), vec![3, 1, 2]);
    assert_eq!(store.get(1).unwrap().stats.total_votes, 99);
    assert_eq!(store.get(3).unwrap().stats, VotingStats { total_votes: 10, yes_votes: 4, no_votes: 5, abstain_votes: 1 });
  }

  #[tokio::test]
  async fn load_fills_both_collections_and_dedupes_preparing() {
    let mut backend = MockBackend::default();
    backend.sessions = vec![session_fixture(10, "Revisao de Orcamento 2025")];
    let mut dup = proposal_fixture(7, "Mobilidade Urbana", ProposalStatus::Discussion);
    dup.signatures_count = 10;
    let mut dup_later = proposal_fixture(7, "Mobilidade Urbana", ProposalStatus::ThresholdReached);
    dup_later.signatures_count = 25;
    backend.preparing = vec![
      dup,
      proposal_fixture(8, "Plano Diretor", ProposalStatus::AwaitingReview),
      dup_later,
    ];

    let mut board = VotingBoard::new();
    board.load(&backend).await;

    assert!(!board.loading_sessions);
    assert!(!board.loading_preparing);
    assert_eq!(board.sessions.len(), 1);
    assert_eq!(board.preparing.len(), 2);
    let merged = board.preparing.iter().find(|p| p.id == 7).unwrap();
    // Last-seen snapshot wins across status filters (observed policy).
    assert_eq!(merged.signatures_count, 25);
  }

  #[tokio::test]
  async fn failed_sessions_fetch_does_not_block_preparing() {
    let mut backend = MockBackend::default();
    backend.sessions_error = Some(500);
    backend.preparing = vec![proposal_fixture(1, "Plano Diretor", ProposalStatus::Discussion)];

    let mut board = VotingBoard::new();
    board.load(&backend).await;

    assert!(board.sessions.is_empty());
    assert_eq!(board.preparing.len(), 1);
    assert!(!board.loading_sessions);
    assert!(!board.loading_preparing);
  }

  #[tokio::test]
  async fn failed_preparing_fetch_keeps_previous_list() {
    let mut backend = MockBackend::default();
    backend.sessions = vec![session_fixture(10, "Revisao de Orcamento 2025")];
    backend.preparing = vec![proposal_fixture(1, "Plano Diretor", ProposalStatus::Discussion)];

    let mut board = VotingBoard::new();
    board.load(&backend).await;
    assert_eq!(board.preparing.len(), 1);

    backend.proposals_error = Some(503);
    board.load(&backend).await;
    assert_eq!(board.preparing.len(), 1);
    assert_eq!(board.sessions.len(), 1);
  }

  #[test]
  fn filter_is_case_insensitive_substring_over_title_and_summary() {
    let mut board = VotingBoard::new();
    board.sessions.replace_all(vec![
      session_fixture(1, "Revisão de Orçamento 2025"),
      session_fixture(2, "Plano Diretor"),
    ]);

    let hits = board.filter_sessions("orçamento");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].proposal_id, 1);

    assert!(board.filter_sessions("zoneamento").is_empty());
    // Empty query is the identity projection.
    assert_eq!(board.filter_sessions("").len(), 2);
  }

  #[test]
  fn apply_vote_patches_by_id() {
    let mut board = VotingBoard::new();
    board.sessions.replace_all(vec![session_fixture(5, "A"), session_fixture(6, "B")]);

    let updated = board.apply_vote(6, VoteChoice::Yes).unwrap();
    assert_eq!(updated.stats.total_votes, 11);
    assert!(board.sessions.get(6).unwrap().user_state.has_voted);
    assert!(!board.sessions.get(5).unwrap().user_state.has_voted);
    assert!(board.apply_vote(99, VoteChoice::No).is_none());
  }
}
