// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Command-line arguments for the `fittrack` binary.

use crate::models::{ActivityType, NewActivityRequest};
use crate::time_utils::parse_timestamp;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "fittrack")]
#[command(about = "Log workouts and read AI fitness recommendations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in through the browser (OAuth2 + PKCE)
    Login,

    /// Sign out and forget the stored credential
    Logout,

    /// Show who is signed in and when the token expires
    Status,

    /// List, show or log activities
    Activities {
        #[command(subcommand)]
        command: ActivitiesCommand,
    },

    /// Show the AI recommendation for one activity
    Recommendation { activity_id: String },

    /// List every recommendation for a user (defaults to the signed-in user)
    Recommendations {
        #[arg(long)]
        user: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ActivitiesCommand {
    /// List logged activities
    List,

    /// Show one activity
    Show { id: String },

    /// Log a new activity
    Add(AddActivityArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AddActivityArgs {
    /// Activity type, e.g. running, weight-training, hiit
    #[arg(long = "type")]
    pub activity_type: ActivityType,

    /// Duration in minutes
    #[arg(long, allow_negative_numbers = true)]
    pub duration: i32,

    /// Calories burnt
    #[arg(long, allow_negative_numbers = true)]
    pub calories: i32,

    /// Extra metric as key=value (repeatable); JSON values are kept typed
    #[arg(long = "metric", value_parser = parse_metric)]
    pub metrics: Vec<(String, serde_json::Value)>,

    /// When the activity started (RFC 3339 or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, value_parser = parse_start_time)]
    pub start_time: Option<DateTime<Utc>>,
}

impl AddActivityArgs {
    pub fn into_request(self) -> NewActivityRequest {
        let mut request = NewActivityRequest::new(self.activity_type, self.duration, self.calories);
        if let Some(start_time) = self.start_time {
            request = request.with_start_time(start_time);
        }
        self.metrics
            .into_iter()
            .fold(request, |req, (key, value)| req.with_metric(key, value))
    }
}

/// Parse `key=value`; the value is JSON when it parses as JSON, a string otherwise.
pub fn parse_metric(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("metric name missing in `{}`", raw));
    }

    let value = serde_json::from_str(value.trim())
        .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
    Ok((key.to_string(), value))
}

fn parse_start_time(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).ok_or_else(|| format!("invalid timestamp `{}`", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metric() {
        assert_eq!(
            parse_metric("heartRate=142").unwrap(),
            ("heartRate".to_string(), json!(142))
        );
        assert_eq!(
            parse_metric("route = river loop").unwrap(),
            ("route".to_string(), json!("river loop"))
        );
        assert!(parse_metric("novalue").is_err());
        assert!(parse_metric("=3").is_err());
    }

    #[test]
    fn test_add_command_builds_request() {
        let cli = Cli::try_parse_from([
            "fittrack",
            "activities",
            "add",
            "--type",
            "weight-training",
            "--duration",
            "45",
            "--calories",
            "300",
            "--metric",
            "sets=5",
        ])
        .unwrap();

        let Commands::Activities {
            command: ActivitiesCommand::Add(args),
        } = cli.command
        else {
            panic!("expected activities add");
        };

        let request = args.into_request();
        assert_eq!(request.activity_type, ActivityType::WeightTraining);
        assert_eq!(request.duration, 45);
        assert_eq!(request.calories_burnt, 300);
        assert_eq!(request.additional_metrics.get("sets"), Some(&json!(5)));
    }

    #[test]
    fn test_negative_duration_reaches_validation() {
        let cli = Cli::try_parse_from([
            "fittrack", "activities", "add", "--type", "yoga", "--duration", "-5", "--calories", "10",
        ])
        .unwrap();
        let Commands::Activities {
            command: ActivitiesCommand::Add(args),
        } = cli.command
        else {
            panic!("expected activities add");
        };
        assert_eq!(args.duration, -5);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = Cli::try_parse_from([
            "fittrack", "activities", "add", "--type", "rowing", "--duration", "5", "--calories", "10",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_json_flag() {
        let cli = Cli::try_parse_from(["fittrack", "activities", "list", "--json"]).unwrap();
        assert!(cli.json);
    }
}
