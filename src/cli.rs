use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::signal;

use crate::{
  session_progress, ActiveVotingSession, BallotError, BallotNotice, CachedBackend, ClientConfig,
  IssuePriority, IssueQuery, IssueStatus, Proposal, ProposalQuery, ProposalStatus, VoteChoice,
  VotingView,
};

#[derive(Parser)]
#[command(name = "civicgit", version, about = "Cliente CivicGit: votacoes, propostas e issues via API")]
pub struct Cli {
  #[command(flatten)]
  pub config: ClientConfig,
  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
  /// Authenticate and persist the session token.
  Login {
    username: String,
    #[clap(long, env = "CIVICGIT_PASSWORD", hide_env_values = true)]
    password: String,
  },
  /// End the session, server-side and locally.
  Logout,
  /// Show the authenticated user.
  Whoami,
  /// Active voting sessions with tallies and window progress.
  Sessions {
    #[clap(long)]
    search: Option<String>,
  },
  /// Proposals still gathering signatures or awaiting review.
  Preparing {
    #[clap(long)]
    search: Option<String>,
  },
  /// Cast a vote on a proposal under active voting.
  Vote {
    proposal_id: i64,
    #[clap(value_enum)]
    choice: VoteChoice,
  },
  /// List proposals, optionally filtered server-side.
  Proposals {
    #[clap(long, value_enum)]
    status: Option<ProposalStatus>,
    #[clap(long)]
    repository: Option<i64>,
    #[clap(long)]
    search: Option<String>,
  },
  /// List policy repositories.
  Repositories,
  /// List issues, optionally filtered server-side.
  Issues {
    #[clap(long, value_enum)]
    status: Option<IssueStatus>,
    #[clap(long, value_enum)]
    priority: Option<IssuePriority>,
    #[clap(long)]
    search: Option<String>,
  },
  /// Platform-wide admin counters.
  Metrics,
  /// Keep the voting view on screen, refreshing until interrupted.
  Watch {
    /// Seconds between refreshes.
    #[clap(long, default_value = "30")]
    interval: u64,
    #[clap(long)]
    search: Option<String>,
  },
}

impl Cli {
  pub async fn run(self) -> Result<()> {
    tracing_subscriber::fmt::init();
    let api = self.config.to_api();

    match self.command {
      Command::Login { username, password } => {
        let auth = api.login(&username, &password).await?;
        println!("Sessao iniciada para {} <{}>.", auth.user.username, auth.user.email);
      }
      Command::Logout => {
        if let Err(error) = api.logout().await {
          tracing::debug!(%error, "server-side logout failed; local session already purged");
        }
        println!("Sessao encerrada.");
      }
      Command::Whoami => {
        let user = api.current_user().await?;
        println!(
          "{} <{}> - reputacao {}, {} contribuicoes",
          user.username, user.email, user.reputation_score, user.contributions_count
        );
      }
      Command::Sessions { search } => {
        let mut view = VotingView::new();
        view.load(&api).await;
        print_sessions(&view, search.as_deref().unwrap_or(""));
      }
      Command::Preparing { search } => {
        let mut view = VotingView::new();
        view.load(&api).await;
        print_preparing(&view, search.as_deref().unwrap_or(""));
      }
      Command::Vote { proposal_id, choice } => {
        cast_vote(&api, proposal_id, choice).await?;
      }
      Command::Proposals { status, repository, search } => {
        let query = ProposalQuery { repository_id: repository, status, search };
        for proposal in api.proposals(&query).await? {
          print_proposal(&proposal);
        }
      }
      Command::Repositories => {
        for repository in api.repositories().await? {
          println!(
            "#{} {} - {} propostas, {} issues",
            repository.id, repository.name, repository.proposals_count, repository.issues_count
          );
        }
      }
      Command::Issues { status, priority, search } => {
        let query = IssueQuery { repository_id: None, status, priority, search };
        for issue in api.issues(&query).await? {
          println!("#{} [{}/{}] {}", issue.number, issue.status, issue.priority, issue.title);
        }
      }
      Command::Metrics => {
        let metrics = api.admin_metrics().await?;
        println!(
          "repositorios: {} | propostas: {} | issues: {} | usuarios: {}",
          metrics.repositories, metrics.proposals, metrics.issues, metrics.users
        );
        let activity = api.admin_activity().await?;
        println!(
          "novos usuarios na semana: {} | novos repositorios: {}",
          activity.new_users_week, activity.new_repositories_week
        );
      }
      Command::Watch { interval, search } => {
        watch(api, interval, search.as_deref().unwrap_or("")).await?;
      }
    }
    Ok(())
  }
}

async fn cast_vote(api: &crate::Api, proposal_id: i64, choice: VoteChoice) -> Result<()> {
  let mut view = VotingView::new();
  view.load(api).await;

  match view.open_ballot(proposal_id) {
    Ok(_) => {}
    Err(BallotError::AlreadyVoted) => {
      let registered = view
        .board
        .sessions
        .get(proposal_id)
        .and_then(|session| session.user_state.choice)
        .map(|c| c.label())
        .unwrap_or("registrado");
      println!("Voce ja votou nesta proposta: {registered}.");
      return Ok(());
    }
    Err(BallotError::UnknownSession) => {
      anyhow::bail!("proposta {proposal_id} nao esta em votacao ativa");
    }
    Err(error) => return Err(error.into()),
  }

  view.select(choice)?;
  view.submit_ballot(api, Utc::now()).await?;

  match view.ballot().and_then(|ballot| ballot.notice.clone()) {
    Some(BallotNotice::Success(message)) => {
      println!("{message} ({})", choice.label());
      if let Some(session) = view.board.sessions.get(proposal_id) {
        println!(
          "Totais: {} votos | {} a favor | {} contra | {} abstencoes",
          session.stats.total_votes,
          session.stats.yes_votes,
          session.stats.no_votes,
          session.stats.abstain_votes
        );
      }
      Ok(())
    }
    Some(BallotNotice::Error(message)) => anyhow::bail!(message),
    None => Ok(()),
  }
}

async fn watch(api: crate::Api, interval_secs: u64, query: &str) -> Result<()> {
  let backend = CachedBackend::new(api);
  let mut view = VotingView::new();
  let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));

  loop {
    tokio::select! {
      _ = signal::ctrl_c() => break,
      _ = ticker.tick() => {
        view.load(&backend).await;
        println!("\n--- {} ---", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        print_sessions(&view, query);
        print_preparing(&view, query);
      }
    }
  }
  println!("Encerrando acompanhamento.");
  Ok(())
}

fn print_sessions(view: &VotingView, query: &str) {
  let sessions = view.board.filter_sessions(query);
  if sessions.is_empty() {
    println!("Nenhuma votacao ativa no momento.");
    return;
  }
  let now = Utc::now();
  for session in sessions {
    print_session(session, now);
  }
}

fn print_session(session: &ActiveVotingSession, now: chrono::DateTime<Utc>) {
  let progress = session_progress(&session.starts_at, &session.ends_at, now);
  let voted = if session.user_state.has_voted { " [voto registrado]" } else { "" };
  println!("#{} {}{voted}", session.proposal_id, session.title);
  println!(
    "   {} {:>3.0}% - {} | {} votos ({} sim / {} nao / {} abstencao)",
    progress_bar(progress.percent),
    progress.percent,
    progress.label,
    session.stats.total_votes,
    session.stats.yes_votes,
    session.stats.no_votes,
    session.stats.abstain_votes
  );
}

fn print_preparing(view: &VotingView, query: &str) {
  let preparing = view.board.filter_preparing(query);
  if preparing.is_empty() {
    println!("Nenhuma proposta em preparacao encontrada.");
    return;
  }
  println!("Em preparacao:");
  for proposal in preparing {
    print_proposal(proposal);
  }
}

fn print_proposal(proposal: &Proposal) {
  println!(
    "#{} [{}] {} - {} assinaturas, {} votos",
    proposal.id, proposal.status, proposal.title, proposal.signatures_count, proposal.votes_count
  );
}

fn progress_bar(percent: f64) -> String {
  let filled = ((percent / 100.0 * 20.0).round() as usize).min(20);
  format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}
