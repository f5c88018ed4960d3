use thiserror::Error;

use crate::{ActiveVotingSession, VoteChoice};

/// Fallback inline message when the server gave no `detail` string.
pub const GENERIC_VOTE_ERROR: &str = "Nao foi possivel registrar o voto. Tente novamente em instantes.";

/// Refusals of the submission surface. These are view-level rule violations,
/// not backend failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BallotError {
  #[error("voce ja registrou seu voto nesta proposta")]
  AlreadyVoted,
  #[error("sessao de votacao desconhecida")]
  UnknownSession,
  #[error("nenhuma opcao selecionada")]
  NothingSelected,
  #[error("ha um voto sendo registrado - aguarde")]
  SubmissionInFlight,
  #[error("nenhuma votacao aberta")]
  NotOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotPhase {
  /// Collecting a choice; commit stays disabled until one is selected.
  Selecting,
  /// Request in flight. The surface cannot be closed in this phase.
  Submitting,
  /// Server acknowledged; surface auto-closes shortly unless dismissed first.
  Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BallotNotice {
  Success(String),
  Error(String),
}

/// The single open vote-submission surface. At most one exists per view
/// (see [`VotingView`]), which is what makes submissions single-flight from
/// one client instance.
///
/// [`VotingView`]: crate::VotingView
#[derive(Debug, Clone)]
pub struct Ballot {
  pub session: ActiveVotingSession,
  pub choice: Option<VoteChoice>,
  pub phase: BallotPhase,
  pub notice: Option<BallotNotice>,
}

impl Ballot {
  /// Opens the surface for a session. Refused outright once the user's state
  /// is terminal: `has_voted` never goes back to false.
  pub fn open(session: ActiveVotingSession) -> Result<Ballot, BallotError> {
    if session.user_state.has_voted {
      return Err(BallotError::AlreadyVoted);
    }
    Ok(Ballot { session, choice: None, phase: BallotPhase::Selecting, notice: None })
  }

  pub fn select(&mut self, choice: VoteChoice) -> Result<(), BallotError> {
    if self.phase != BallotPhase::Selecting {
      return Err(BallotError::SubmissionInFlight);
    }
    self.choice = Some(choice);
    Ok(())
  }

  pub fn can_submit(&self) -> bool {
    self.phase == BallotPhase::Selecting && self.choice.is_some()
  }

  pub fn is_submitting(&self) -> bool {
    self.phase == BallotPhase::Submitting
  }
}
