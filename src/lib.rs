mod admin;
mod api;
mod auth;
mod ballot;
mod board;
mod cache;
mod cli;
mod config;
mod error;
mod issue;
mod progress;
mod proposal;
mod repository;
mod util;
mod view;
mod voting;

pub use admin::*;
pub use api::*;
pub use auth::*;
pub use ballot::*;
pub use board::*;
pub use cache::*;
pub use cli::*;
pub use config::*;
pub use error::*;
pub use issue::*;
pub use progress::*;
pub use proposal::*;
pub use repository::*;
pub use util::*;
pub use view::*;
pub use voting::*;
