use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
#[clap(rename_all = "lowercase")]
pub enum VoteChoice {
  #[display("yes")]
  Yes,
  #[display("no")]
  No,
  #[display("abstain")]
  Abstain,
}

impl VoteChoice {
  /// Portuguese label shown next to a registered vote.
  pub fn label(&self) -> &'static str {
    match self {
      VoteChoice::Yes => "A favor",
      VoteChoice::No => "Contra",
      VoteChoice::Abstain => "Abstencao",
    }
  }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingStats {
  pub total_votes: i64,
  pub yes_votes: i64,
  pub no_votes: i64,
  pub abstain_votes: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserVotingState {
  pub has_voted: bool,
  #[serde(default)]
  pub choice: Option<VoteChoice>,
}

/// Read-only snapshot of a proposal under vote, as served by
/// `/voting/sessions/active`. Mutated locally only by [`record_vote`] after
/// the server acknowledged the submission.
///
/// [`record_vote`]: ActiveVotingSession::record_vote
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActiveVotingSession {
  pub proposal_id: i64,
  pub repository_id: i64,
  pub session_id: i64,
  pub title: String,
  pub summary: String,
  pub starts_at: String,
  pub ends_at: String,
  pub stats: VotingStats,
  pub user_state: UserVotingState,
}

impl ActiveVotingSession {
  /// Applies the acknowledged vote to the local snapshot: total and the
  /// matching option counter go up by one, and the user state becomes
  /// terminal (`has_voted` never goes back to false).
  pub fn record_vote(&self, choice: VoteChoice) -> ActiveVotingSession {
    let mut updated = self.clone();
    updated.stats.total_votes += 1;
    match choice {
      VoteChoice::Yes => updated.stats.yes_votes += 1,
      VoteChoice::No => updated.stats.no_votes += 1,
      VoteChoice::Abstain => updated.stats.abstain_votes += 1,
    }
    updated.user_state = UserVotingState { has_voted: true, choice: Some(choice) };
    updated
  }

  /// Case-insensitive substring match over title and summary.
  pub fn matches(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    self.title.to_lowercase().contains(&needle) || self.summary.to_lowercase().contains(&needle)
  }
}

#[derive(Serialize, Debug, Clone)]
pub struct VoteRequest {
  pub option: VoteChoice,
}

#[derive(Deserialize, Debug, Clone)]
pub struct VoteResponse {
  pub proposal_id: i64,
  pub session_id: i64,
  pub selected_option_id: i64,
  pub selected_option_value: String,
  pub total_votes: i64,
  pub message: String,
  pub voted_at: String,
}

#[cfg(test)]
pub(crate) fn session_fixture(proposal_id: i64, title: &str) -> ActiveVotingSession {
  ActiveVotingSession {
    proposal_id,
    repository_id: 1,
    session_id: proposal_id * 10,
    title: title.to_string(),
    summary: "Sessao aberta para participacao.".to_string(),
    starts_at: "2025-03-01T00:00:00".to_string(),
    ends_at: "2025-03-08T00:00:00".to_string(),
    stats: VotingStats { total_votes: 10, yes_votes: 4, no_votes: 5, abstain_votes: 1 },
    user_state: UserVotingState::default(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn session() -> ActiveVotingSession {
    session_fixture(9, "Revisao de Orcamento 2025")
  }

  #[test]
  fn record_vote_bumps_total_and_matching_option() {
    let updated = session().record_vote(VoteChoice::Yes);
    assert_eq!(updated.stats, VotingStats { total_votes: 11, yes_votes: 5, no_votes: 5, abstain_votes: 1 });
    assert_eq!(updated.user_state, UserVotingState { has_voted: true, choice: Some(VoteChoice::Yes) });
  }

  #[test]
  fn record_vote_leaves_other_options_untouched() {
    let updated = session().record_vote(VoteChoice::Abstain);
    assert_eq!(updated.stats.abstain_votes, 2);
    assert_eq!(updated.stats.yes_votes, 4);
    assert_eq!(updated.stats.no_votes, 5);
    assert_eq!(updated.stats.total_votes, 11);
  }

  #[test]
  fn choice_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&VoteChoice::Yes).unwrap(), "\"yes\"");
    assert_eq!(serde_json::to_string(&VoteChoice::Abstain).unwrap(), "\"abstain\"");
    let parsed: UserVotingState = serde_json::from_str(r#"{"has_voted":true,"choice":"no"}"#).unwrap();
    assert_eq!(parsed.choice, Some(VoteChoice::No));
  }

  #[test]
  fn matches_is_case_and_accent_faithful() {
    let s = session();
    assert!(s.matches("orcamento"));
    assert!(s.matches("ORCAMENTO"));
    assert!(s.matches(""));
    assert!(!s.matches("plano diretor"));
  }
}
