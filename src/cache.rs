use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::{ActiveVotingSession, Proposal, ProposalStatus, Result, VoteChoice, VoteResponse, VotingBackend};

type ArcProposals = Arc<Vec<Proposal>>;

pub type PreparingCache = MokaCache<String, ArcProposals>;

/// TTL caches for the long-running watch mode. Preparing lists move slowly,
/// so refresh cycles re-hit the network for sessions but not for these.
#[derive(Clone)]
pub struct Caches {
  pub preparing: PreparingCache,
}

impl Caches {
  pub fn build() -> Self {
    Self {
      preparing: PreparingCache::builder().time_to_live(Duration::from_secs(60 * 5)).build(),
    }
  }
}

/// Cache-aside wrapper over a [`VotingBackend`]. Session fetches and vote
/// submissions always pass through; only the per-status preparing fetches
/// are served from cache within the TTL.
pub struct CachedBackend<B> {
  inner: B,
  caches: Caches,
}

impl<B> CachedBackend<B> {
  pub fn new(inner: B) -> Self {
    Self { inner, caches: Caches::build() }
  }
}

#[async_trait]
impl<B: VotingBackend + Send + Sync> VotingBackend for CachedBackend<B> {
  async fn active_sessions(&self) -> Result<Vec<ActiveVotingSession>> {
    self.inner.active_sessions().await
  }

  async fn proposals_by_status(&self, status: ProposalStatus) -> Result<Vec<Proposal>> {
    let key = status.to_string();
    if let Some(cached) = self.caches.preparing.get(&key).await {
      return Ok(cached.to_vec());
    }
    let fresh = self.inner.proposals_by_status(status).await?;
    self.caches.preparing.insert(key, Arc::new(fresh.clone())).await;
    Ok(fresh)
  }

  async fn cast_vote(&self, proposal_id: i64, choice: VoteChoice) -> Result<VoteResponse> {
    self.inner.cast_vote(proposal_id, choice).await
  }
}
