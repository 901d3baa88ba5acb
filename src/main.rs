mod args;
mod commands;
mod config;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use cadence_core::{EventOverrides, Frequency, View, Window};
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::detach::Edit;
use crate::commands::encode::RuleSource;
use crate::config::CadenceConfig;

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Encode, expand and inspect recurring calendar events")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build rule text from flags or from the event form's JSON
    Encode {
        /// daily, weekly, monthly or yearly
        #[arg(long = "freq", value_parser = args::parse_frequency, required_unless_present = "form")]
        frequency: Option<Frequency>,

        /// First occurrence (e.g. "2025-03-20T15:00")
        #[arg(short, long)]
        start: String,

        #[arg(short, long, default_value_t = 1)]
        interval: u32,

        /// Weekly only: days to repeat on (e.g. "mo,we,fr")
        #[arg(short, long)]
        weekdays: Option<String>,

        /// Stop after this many occurrences
        #[arg(long, conflicts_with = "until")]
        count: Option<u32>,

        /// Last date an occurrence may start on (YYYY-MM-DD)
        #[arg(long)]
        until: Option<NaiveDate>,

        /// Recurrence form JSON, e.g. '{"frequency":"weekly","endType":"never"}'
        #[arg(long, conflicts_with_all = ["frequency", "weekdays", "count", "until"])]
        form: Option<String>,

        /// Time zone the rule repeats in (defaults to config)
        #[arg(long)]
        timezone: Option<Tz>,
    },
    /// Describe stored rule text ("\n" separates lines)
    Describe {
        rule: String,

        /// Print the recurrence form JSON instead
        #[arg(long)]
        form: bool,
    },
    /// List the occurrences of a rule
    Occurrences {
        rule: String,

        /// Length of each occurrence (e.g. "30m", "1h")
        #[arg(short, long, default_value = "1h")]
        duration: String,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Show the agenda for a JSON export of event rows
    Agenda {
        file: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Print occurrences as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit or cancel one occurrence of a series, printing the row to store
    Detach {
        file: PathBuf,

        /// Id of the recurring event
        series: String,

        /// Scheduled start of the occurrence
        #[arg(long)]
        at: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(long)]
        all_day: Option<bool>,

        /// Move the occurrence to this start
        #[arg(long)]
        start: Option<String>,

        /// New end for the occurrence
        #[arg(long)]
        end: Option<String>,

        /// Remove the occurrence instead
        #[arg(long, conflicts_with_all = ["title", "description", "location", "all_day", "start", "end"])]
        cancel: bool,
    },
    /// List rows to delete along with a series
    Dependents { file: PathBuf, series: String },
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a commented default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Change one setting (timezone, week_start or default_view)
    Set { key: String, value: String },
}

#[derive(Args)]
struct WindowArgs {
    /// Show events from this date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,

    /// Show events until this date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,

    /// day, week or month around --date
    #[arg(long, conflicts_with_all = ["from", "to"])]
    view: Option<View>,

    /// Date to center the view on (defaults to today)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    date: Option<NaiveDate>,
}

impl WindowArgs {
    fn resolve(&self, config: &CadenceConfig, tz: Tz) -> Result<Window> {
        if self.from.is_some() || self.to.is_some() {
            return Ok(Window::from_args(
                self.from.as_deref(),
                self.to.as_deref(),
                tz,
                Utc::now(),
            )?);
        }

        let date = self
            .date
            .unwrap_or_else(|| Utc::now().with_timezone(&tz).date_naive());
        let view = self.view.unwrap_or(config.default_view);

        Ok(Window::for_view(view, date, tz, config.week_start))
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        // Config commands must work even when the current file is broken
        Commands::Config { command } => match command {
            None => commands::config::run(),
            Some(ConfigCommands::Init { force }) => commands::config::init(force),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(&key, &value),
        },
        command => run(command, CadenceConfig::load()?).await,
    }
}

async fn run(command: Commands, config: CadenceConfig) -> Result<()> {
    match command {
        Commands::Encode {
            frequency,
            start,
            interval,
            weekdays,
            count,
            until,
            form,
            timezone,
        } => {
            let tz = match timezone {
                Some(tz) => tz,
                None => config.timezone()?,
            };
            let start = args::parse_datetime(&start, tz)?;

            let source = match (form, frequency) {
                (Some(json), _) => RuleSource::Form(json),
                (None, Some(frequency)) => RuleSource::Flags {
                    frequency,
                    interval,
                    weekdays: match weekdays {
                        Some(list) => args::parse_weekdays(&list)?,
                        None => Vec::new(),
                    },
                    count,
                    until,
                },
                (None, None) => anyhow::bail!("Either --freq or --form is required"),
            };

            commands::encode::run(source, start, tz, config.week_start)
        }
        Commands::Describe { rule, form } => {
            commands::describe::run(&args::unescape_rule(&rule), config.timezone()?, form)
        }
        Commands::Occurrences {
            rule,
            duration,
            window,
        } => {
            let tz = config.timezone()?;
            let duration: Duration = args::parse_duration(&duration)?;
            let window = window.resolve(&config, tz)?;
            commands::occurrences::run(&args::unescape_rule(&rule), duration, window, tz)
        }
        Commands::Agenda { file, window, json } => {
            let tz = config.timezone()?;
            let window = window.resolve(&config, tz)?;
            commands::agenda::run(&file, window, tz, json).await
        }
        Commands::Detach {
            file,
            series,
            at,
            title,
            description,
            location,
            all_day,
            start,
            end,
            cancel,
        } => {
            let tz = config.timezone()?;
            let original_start = args::parse_datetime(&at, tz)?;

            let edit = if cancel {
                Edit::Cancel
            } else {
                Edit::Override(EventOverrides {
                    title,
                    description,
                    location,
                    all_day,
                    start: start.map(|s| args::parse_datetime(&s, tz)).transpose()?,
                    end: end.map(|s| args::parse_datetime(&s, tz)).transpose()?,
                })
            };

            commands::detach::run(&file, &series, original_start, edit).await
        }
        Commands::Dependents { file, series } => commands::dependents::run(&file, &series).await,
        Commands::Config { .. } => Ok(()),
    }
}
