use chrono::{DateTime, Duration, Utc};

use crate::{
  Ballot, BallotError, BallotNotice, BallotPhase, ClientError, Result, VoteChoice, VotingBackend,
  VotingBoard, GENERIC_VOTE_ERROR,
};

/// How long a confirmed ballot stays on screen before closing on its own.
pub const AUTO_CLOSE_DELAY_MS: i64 = 1200;

/// The voting page as a whole: the two collections plus at most one open
/// submission surface. Holding the surface as a single `Option` is what
/// enforces "one modal at a time" - there is nowhere to hang a second one.
pub struct VotingView {
  pub board: VotingBoard,
  ballot: Option<Ballot>,
  auto_close_at: Option<DateTime<Utc>>,
}

impl VotingView {
  pub fn new() -> Self {
    Self { board: VotingBoard::new(), ballot: None, auto_close_at: None }
  }

  pub async fn load<B: VotingBackend + Sync>(&mut self, backend: &B) {
    self.board.load(backend).await;
  }

  pub fn ballot(&self) -> Option<&Ballot> {
    self.ballot.as_ref()
  }

  /// Opens the submission surface for a stored session. An already-open
  /// surface is replaced, unless a submission is in flight.
  pub fn open_ballot(&mut self, proposal_id: i64) -> Result<&Ballot, BallotError> {
    if self.ballot.as_ref().is_some_and(Ballot::is_submitting) {
      return Err(BallotError::SubmissionInFlight);
    }
    let session =
      self.board.sessions.get(proposal_id).cloned().ok_or(BallotError::UnknownSession)?;
    let ballot = Ballot::open(session)?;
    self.auto_close_at = None;
    Ok(self.ballot.insert(ballot))
  }

  pub fn select(&mut self, choice: VoteChoice) -> Result<(), BallotError> {
    self.ballot.as_mut().ok_or(BallotError::NotOpen)?.select(choice)
  }

  /// Dismissal is permitted from every phase except mid-flight: closing then
  /// would orphan the request from the view's perspective.
  pub fn close_ballot(&mut self) -> Result<(), BallotError> {
    match &self.ballot {
      None => Ok(()),
      Some(ballot) if ballot.is_submitting() => Err(BallotError::SubmissionInFlight),
      Some(_) => {
        self.ballot = None;
        self.auto_close_at = None;
        Ok(())
      }
    }
  }

  /// Submits the selected choice. The local tally is patched only after the
  /// server acknowledged; a refused submission leaves tally and user state
  /// exactly as they were and keeps the surface open for a retry. Credential
  /// expiry is not absorbed here - it propagates so the caller can send the
  /// user back to login.
  pub async fn submit_ballot<B: VotingBackend + Sync>(
    &mut self,
    backend: &B,
    now: DateTime<Utc>,
  ) -> Result<(), ClientError> {
    let mut ballot = match self.ballot.take() {
      Some(ballot) if ballot.phase == BallotPhase::Selecting => ballot,
      other => {
        self.ballot = other;
        return Ok(());
      }
    };
    let Some(choice) = ballot.choice else {
      self.ballot = Some(ballot);
      return Ok(());
    };
    let proposal_id = ballot.session.proposal_id;

    ballot.phase = BallotPhase::Submitting;
    let outcome = backend.cast_vote(proposal_id, choice).await;

    match outcome {
      Ok(_) => {
        if let Some(updated) = self.board.apply_vote(proposal_id, choice) {
          ballot.session = updated;
        }
        ballot.phase = BallotPhase::Confirmed;
        ballot.notice = Some(BallotNotice::Success("Voto confirmado!".to_string()));
        self.ballot = Some(ballot);
        self.auto_close_at = Some(now + Duration::milliseconds(AUTO_CLOSE_DELAY_MS));
        Ok(())
      }
      Err(ClientError::AuthExpired) => {
        self.auto_close_at = None;
        Err(ClientError::AuthExpired)
      }
      Err(error) => {
        tracing::warn!(%error, proposal_id, "vote submission failed");
        let text = error.detail().unwrap_or(GENERIC_VOTE_ERROR).to_string();
        ballot.phase = BallotPhase::Selecting;
        ballot.notice = Some(BallotNotice::Error(text));
        self.ballot = Some(ballot);
        Ok(())
      }
    }
  }

  /// Advances view-owned time: expires the post-confirmation deadline and
  /// closes the surface. Call whenever "now" moves (render loop, timer).
  pub fn tick(&mut self, now: DateTime<Utc>) {
    if self.auto_close_at.is_some_and(|deadline| now >= deadline) {
      self.ballot = None;
      self.auto_close_at = None;
    }
  }
}

impl Default for VotingView {
  fn default() -> Self {
    Self::new()
  }
}
