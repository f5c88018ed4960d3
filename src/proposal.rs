use std::collections::HashMap;

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::Wrapper;

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum ProposalStatus {
  #[display("draft")]
  Draft,
  #[display("discussion")]
  Discussion,
  #[display("awaiting_review")]
  AwaitingReview,
  #[display("threshold_reached")]
  ThresholdReached,
  #[display("voting")]
  Voting,
  #[display("approved")]
  Approved,
  #[display("rejected")]
  Rejected,
  #[display("withdrawn")]
  Withdrawn,
}

/// Pre-voting statuses shown in the "em preparacao" rail of the voting view.
pub const PREPARING_STATUSES: [ProposalStatus; 3] =
  [ProposalStatus::Discussion, ProposalStatus::AwaitingReview, ProposalStatus::ThresholdReached];

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
  Amendment,
  NewLaw,
  Repeal,
  BudgetAlteration,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Proposal {
  pub id: i64,
  pub number: String,
  pub slug: String,
  pub repository_id: i64,
  pub author_id: i64,
  pub title: String,
  pub summary: String,
  pub justification: String,
  pub full_text: String,
  #[serde(rename = "type")]
  pub kind: ProposalType,
  pub status: ProposalStatus,
  pub branch_name: String,
  pub target_branch: String,
  pub signatures_count: i64,
  pub comments_count: i64,
  pub votes_count: i64,
  pub quorum_required: Option<i64>,
  pub threshold_percentage: Option<f64>,
  pub created_at: String,
  pub updated_at: String,
}

impl Proposal {
  /// Case-insensitive substring match over title and summary.
  pub fn matches(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    self.title.to_lowercase().contains(&needle) || self.summary.to_lowercase().contains(&needle)
  }
}

#[derive(Serialize, Debug, Clone)]
pub struct NewProposal {
  pub title: String,
  pub summary: String,
  pub justification: String,
  pub full_text: String,
  #[serde(rename = "type")]
  pub kind: ProposalType,
}

/// Partial proposal update; absent fields are left untouched server-side.
#[derive(Serialize, Debug, Clone, Default)]
pub struct ProposalUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub justification: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub full_text: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<ProposalStatus>,
}

/// Server-side filters for the proposal listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProposalQuery {
  pub repository_id: Option<i64>,
  pub status: Option<ProposalStatus>,
  pub search: Option<String>,
}

impl ProposalQuery {
  pub fn status(status: ProposalStatus) -> Self {
    Self { status: Some(status), ..Self::default() }
  }

  pub fn to_params(&self) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(repository_id) = self.repository_id {
      params.push(("repository_id", repository_id.to_string()));
    }
    if let Some(status) = self.status {
      params.push(("status", status.to_string()));
    }
    if let Some(search) = &self.search {
      params.push(("search", search.clone()));
    }
    params
  }
}

impl Wrapper<Vec<Proposal>> {
  /// Collapses proposals fetched across several status filters into one entry
  /// per id, preserving first-seen order. A proposal matching two filters
  /// keeps the attributes of its last-fetched snapshot.
  pub fn merge_by_id(self) -> Wrapper<Vec<Proposal>> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_id: HashMap<i64, Proposal> = HashMap::new();
    for proposal in self.0 {
      let id = proposal.id;
      if by_id.insert(id, proposal).is_none() {
        order.push(id);
      }
    }
    Wrapper(order.into_iter().filter_map(|id| by_id.remove(&id)).collect())
  }
}

#[cfg(test)]
pub(crate) fn proposal_fixture(id: i64, title: &str, status: ProposalStatus) -> Proposal {
  Proposal {
    id,
    number: format!("PROP-{id}"),
    slug: title.to_lowercase().replace(' ', "-"),
    repository_id: 1,
    author_id: 1,
    title: title.to_string(),
    summary: "Proposta em consulta publica.".to_string(),
    justification: String::new(),
    full_text: String::new(),
    kind: ProposalType::NewLaw,
    status,
    branch_name: format!("proposal/{id}"),
    target_branch: "main".to_string(),
    signatures_count: 0,
    comments_count: 0,
    votes_count: 0,
    quorum_required: None,
    threshold_percentage: None,
    created_at: "2025-01-01T00:00:00".to_string(),
    updated_at: "2025-01-01T00:00:00".to_string(),
  }
}
