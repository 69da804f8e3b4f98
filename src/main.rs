// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! FitTrack command-line client.
//!
//! Signs in through the browser with OAuth2 + PKCE, then lists and logs
//! activities and shows AI recommendations from the FitTrack API.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::Parser;
use fittrack_client::{
    cli::{ActivitiesCommand, Cli, Commands},
    display,
    error::ClientError,
    AppState,
};
use serde::Serialize;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    // Structured JSON logs on stderr; stdout is command output
    init_logging();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::from_env().context("loading configuration")?;
    tracing::debug!(api_url = %state.config.api_url, "Configuration loaded");

    match cli.command {
        Commands::Login => {
            let credential = state
                .session
                .login(|url| {
                    eprintln!("Open this URL in your browser to sign in:\n\n  {}\n", url);
                })
                .await?;
            if cli.json {
                print_json(&LoginOutput {
                    user_id: credential.user_id(),
                })?;
            } else {
                println!(
                    "Signed in as {}",
                    credential.user_id().unwrap_or("<unknown user>")
                );
            }
        }

        Commands::Logout => {
            state.session.logout().await;
            if !cli.json {
                println!("Signed out.");
            }
        }

        Commands::Status => {
            let credential = state.store.get();
            if cli.json {
                print_json(&StatusOutput {
                    signed_in: credential.is_authenticated(),
                    user_id: credential.user_id(),
                    expires_at: credential.expires_at().map(fittrack_client::time_utils::format_utc_rfc3339),
                })?;
            } else {
                print!("{}", display::credential_status(&credential, Utc::now()));
            }
        }

        Commands::Activities { command } => {
            prepare_session(&state).await?;
            match command {
                ActivitiesCommand::List => {
                    let activities = state.api.list_activities().await.map_err(explain)?;
                    if cli.json {
                        print_json(&activities)?;
                    } else {
                        print!("{}", display::activity_table(&activities));
                    }
                }
                ActivitiesCommand::Show { id } => {
                    let activity = state.api.get_activity(&id).await.map_err(explain)?;
                    if cli.json {
                        print_json(&activity)?;
                    } else {
                        print!("{}", display::activity_detail(&activity));
                    }
                }
                ActivitiesCommand::Add(args) => {
                    let request = args.into_request();
                    let created = state
                        .api
                        .create_activity(&request)
                        .await
                        .map_err(explain)
                        .context("activity was not saved")?;
                    match (created, cli.json) {
                        (Some(activity), true) => print_json(&activity)?,
                        (Some(activity), false) => {
                            println!("Activity logged.");
                            print!("{}", display::activity_detail(&activity));
                        }
                        (None, true) => print_json(&request)?,
                        (None, false) => println!("Activity logged."),
                    }
                }
            }
        }

        Commands::Recommendation { activity_id } => {
            prepare_session(&state).await?;
            match state.api.get_activity_recommendation(&activity_id).await {
                Ok(rec) if cli.json => print_json(&rec)?,
                Ok(rec) => print!("{}", display::recommendation_detail(&rec)),
                Err(e) if e.is_not_found() => {
                    if cli.json {
                        print_json(&serde_json::Value::Null)?;
                    } else {
                        print!("{}", display::no_recommendation(&activity_id));
                    }
                }
                Err(e) => return Err(explain(e)),
            }
        }

        Commands::Recommendations { user } => {
            let credential = prepare_session(&state).await?;
            let Some(user_id) = user.or_else(|| credential.user_id().map(str::to_string)) else {
                bail!("no user id known; pass --user or run `fittrack login`");
            };
            let recs = state
                .api
                .list_user_recommendations(&user_id)
                .await
                .map_err(explain)?;
            if cli.json {
                print_json(&recs)?;
            } else if recs.is_empty() {
                println!("No recommendations yet.");
            } else {
                for rec in &recs {
                    println!("{}", display::recommendation_detail(rec));
                }
            }
        }
    }

    Ok(())
}

/// Refresh a nearly expired token before talking to the API.
async fn prepare_session(
    state: &AppState,
) -> anyhow::Result<fittrack_client::models::Credential> {
    match state.session.ensure_fresh().await {
        Ok(credential) => Ok(credential),
        Err(e) if e.is_auth_error() => {
            bail!("session expired; run `fittrack login`")
        }
        Err(e) => {
            // The current token may still be accepted; let the server decide
            tracing::warn!(error = %e, "Token refresh failed, using current token");
            Ok(state.store.get())
        }
    }
}

fn explain(err: ClientError) -> anyhow::Error {
    if err.is_auth_error() {
        anyhow::Error::new(err).context("not signed in or session expired; run `fittrack login`")
    } else {
        anyhow::Error::new(err)
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginOutput<'a> {
    user_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusOutput<'a> {
    signed_in: bool,
    user_id: Option<&'a str>,
    expires_at: Option<String>,
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fittrack_client=warn,fittrack=warn,warn"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
