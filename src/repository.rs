use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryType {
  Jurisdiction,
  PolicyArea,
  Budget,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryVisibility {
  Public,
  Private,
  Government,
  AffiliatesOnly,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RepositoryOwner {
  pub id: i64,
  pub username: String,
  pub full_name: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewRepository {
  pub name: String,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind: RepositoryType,
  pub visibility: RepositoryVisibility,
}

/// Partial repository update; absent fields are left untouched server-side.
#[derive(Serialize, Debug, Clone, Default)]
pub struct RepositoryUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub visibility: Option<RepositoryVisibility>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_archived: Option<bool>,
}

/// A policy repository: the unit that proposals and issues hang off of.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Repository {
  pub id: i64,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  #[serde(rename = "type")]
  pub kind: RepositoryType,
  pub visibility: RepositoryVisibility,
  pub owner_id: Option<i64>,
  #[serde(default)]
  pub owner: Option<RepositoryOwner>,
  pub jurisdiction_name: Option<String>,
  pub jurisdiction_type: Option<String>,
  pub allow_public_proposals: bool,
  pub allow_public_voting: bool,
  pub require_verification_for_voting: bool,
  pub quorum_percentage: f64,
  pub voting_period_days: i64,
  pub min_signatures_for_voting: i64,
  pub proposals_count: i64,
  pub issues_count: i64,
  pub contributors_count: i64,
  pub is_active: bool,
  pub is_archived: bool,
  pub created_at: String,
  pub updated_at: String,
}
