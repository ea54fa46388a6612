//! xpost - command-line client for the X (Twitter) API v2
//!
//! Each subcommand maps onto one X API operation. Requests are signed with
//! one of three credential variants:
//!
//! - **OAuth 1.0a** user context for most reads and writes
//! - **App-only bearer** for streams, full-archive search, trends and Spaces
//! - **OAuth 2.0 PKCE** user tokens for bookmarks, refreshed on demand
//!
//! Results are printed as JSON on stdout; notes, logs and errors go to
//! stderr.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod authorize;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod credentials;
pub mod error;
pub mod output;
pub mod pagination;
pub mod refresh;
pub mod request;
pub mod retry;
pub mod signer;
pub mod stream;
pub mod token_store;
pub mod types;

pub use client::ApiClient;
pub use commands::{CommandArgs, Context, dispatch};
pub use config::ClientConfig;
pub use credentials::{CredentialChain, Credentials};
pub use error::{XpostError, XpostResult};
pub use output::Output;

/// Run one command against the configured API with the process environment.
///
/// # Errors
///
/// Configuration problems, then whatever the command returns.
pub async fn run(name: &str, args: &CommandArgs) -> XpostResult<()> {
    let config = ClientConfig::from_env()?;
    let chain = CredentialChain::standard(&config);
    let credentials = Credentials::load(&chain);

    let client = ApiClient::new(config, credentials)?;
    let mut ctx = Context::new(client, Output::stdio());
    dispatch(&mut ctx, name, args).await
}
