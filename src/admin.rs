use serde::Deserialize;

/// Platform-wide counters for the admin dashboard.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct AdminMetrics {
  pub repositories: i64,
  pub proposals: i64,
  pub issues: i64,
  pub users: i64,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AdminActivity {
  pub last_admin_login: Option<String>,
  pub new_users_week: i64,
  pub new_repositories_week: i64,
}
