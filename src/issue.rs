use derive_more::Display;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum IssueStatus {
  #[display("open")]
  Open,
  #[display("in_progress")]
  InProgress,
  #[display("resolved")]
  Resolved,
  #[display("closed")]
  Closed,
  #[display("duplicate")]
  Duplicate,
}

#[derive(Serialize, Deserialize, Display, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[clap(rename_all = "snake_case")]
pub enum IssuePriority {
  #[display("low")]
  Low,
  #[display("medium")]
  Medium,
  #[display("high")]
  High,
  #[display("urgent")]
  Urgent,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
  Bug,
  Feature,
  Improvement,
  Policy,
  Infrastructure,
  Service,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Issue {
  pub id: i64,
  pub number: i64,
  pub slug: String,
  pub repository_id: i64,
  pub author_id: i64,
  pub assigned_to_id: Option<i64>,
  pub title: String,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: IssueType,
  pub status: IssueStatus,
  pub priority: IssuePriority,
  #[serde(default)]
  pub tags: Vec<String>,
  pub location: Option<String>,
  pub estimated_cost: Option<f64>,
  pub budget_category: Option<String>,
  pub comments_count: i64,
  pub reactions_count: i64,
  pub created_at: String,
  pub updated_at: String,
  pub closed_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct NewIssue {
  pub repository_id: i64,
  pub title: String,
  pub description: String,
  #[serde(rename = "type")]
  pub kind: IssueType,
  pub priority: IssuePriority,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
}

/// Partial issue update; absent fields are left untouched server-side.
#[derive(Serialize, Debug, Clone, Default)]
pub struct IssueUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status: Option<IssueStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub priority: Option<IssuePriority>,
}

/// Server-side filters for the issue listing endpoint.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
  pub repository_id: Option<i64>,
  pub status: Option<IssueStatus>,
  pub priority: Option<IssuePriority>,
  pub search: Option<String>,
}

impl IssueQuery {
  pub fn to_params(&self) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(repository_id) = self.repository_id {
      params.push(("repository_id", repository_id.to_string()));
    }
    if let Some(status) = self.status {
      params.push(("status", status.to_string()));
    }
    if let Some(priority) = self.priority {
      params.push(("priority", priority.to_string()));
    }
    if let Some(search) = &self.search {
      params.push(("search", search.clone()));
    }
    params
  }
}
