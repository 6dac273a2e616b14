//! CLI entry point for the Olympic graph reports.
//!
//! Connects to Neo4j, runs the requested reports for one athlete, writes the
//! charts to the output directory and prints the report data as JSON on
//! stdout.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dialoguer::{Confirm, Input};
use tracing_subscriber::{fmt, EnvFilter};

use olympics_core::AthleteFilter;
use olympics_graph::GraphClient;
use olympics_report::config::{load_graph_config, load_report_config};
use olympics_report::{FileSink, MedalCharts, OutputFormat, ReportSession};

#[derive(Parser)]
#[command(name = "olympics-report")]
#[command(about = "Chart reports over the Olympic knowledge graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: olympics).
    #[arg(short, long, default_value = "olympics", global = true)]
    config: String,

    /// Directory receiving the charts (overrides config).
    #[arg(short, long, global = true)]
    output_dir: Option<String>,

    /// Chart file format (overrides config).
    #[arg(short, long, value_enum, global = true)]
    format: Option<OutputFormat>,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Args, Clone)]
struct AthleteArgs {
    /// Full athlete name, "First Last".
    #[arg(short, long)]
    name: String,

    /// Birth date (YYYY-MM-DD). Takes precedence over --country.
    #[arg(short, long)]
    born: Option<String>,

    /// Represented country.
    #[arg(long)]
    country: Option<String>,
}

#[derive(Args, Clone, Copy)]
struct MedalArgs {
    /// Skip the medals-per-year bar chart.
    #[arg(long)]
    no_count: bool,

    /// Skip the per-year contribution pies.
    #[arg(long)]
    no_percent: bool,
}

impl From<MedalArgs> for MedalCharts {
    fn from(args: MedalArgs) -> Self {
        Self {
            count: !args.no_count,
            percent: !args.no_percent,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run every report: posts, medals, disciplines, sex composition.
    Report {
        #[command(flatten)]
        athlete: AthleteArgs,
        #[command(flatten)]
        medals: MedalArgs,
    },
    /// Tweets mentioning the athlete per year.
    Posts(AthleteArgs),
    /// Medals per year and share of the country total.
    Medals {
        #[command(flatten)]
        athlete: AthleteArgs,
        #[command(flatten)]
        medals: MedalArgs,
    },
    /// Participations per discipline.
    Disciplines(AthleteArgs),
    /// Sex ratio of each edition the athlete played in.
    Sex(AthleteArgs),
    /// List athletes recorded under a name (homonyms).
    Candidates {
        #[arg(short, long)]
        name: String,
    },
    /// Prompt for the athlete, then run every report.
    Interactive,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cli.json_logs {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    // Prompt before connecting so no connection idles during input.
    let command = match cli.command {
        Command::Interactive => prompt_athlete()?,
        other => other,
    };

    let report_config = load_report_config(&cli.config)?;
    let output_dir = cli.output_dir.unwrap_or(report_config.output_dir);
    let format = cli.format.unwrap_or(report_config.format);

    let graph_config = load_graph_config(&cli.config)?;
    let graph = GraphClient::connect(&graph_config).await?;
    let sink = FileSink::new(&output_dir, format)?;
    let mut session = ReportSession::new(graph, sink);

    let outcome = dispatch(&mut session, command).await;
    let closed = session.close();

    let json = outcome?;
    closed?;
    println!("{json}");
    Ok(())
}

async fn dispatch(
    session: &mut ReportSession<GraphClient, FileSink>,
    command: Command,
) -> anyhow::Result<String> {
    let json = match command {
        Command::Report { athlete, medals } => {
            let summary = session.run_all(&athlete.filter()?, medals.into()).await?;
            serde_json::to_string(&summary)?
        }
        Command::Posts(athlete) => {
            serde_json::to_string(&session.post_counts(&athlete.filter()?).await?)?
        }
        Command::Medals { athlete, medals } => {
            let report = session
                .medal_report(&athlete.filter()?, medals.into())
                .await?;
            serde_json::to_string(&report)?
        }
        Command::Disciplines(athlete) => {
            serde_json::to_string(&session.discipline_histogram(&athlete.filter()?).await?)?
        }
        Command::Sex(athlete) => {
            serde_json::to_string(&session.sex_composition(&athlete.filter()?).await?)?
        }
        Command::Candidates { name } => {
            let filter = AthleteFilter::new(name)?;
            serde_json::to_string(&session.homonym_candidates(&filter).await?)?
        }
        Command::Interactive => anyhow::bail!("interactive mode must be resolved before dispatch"),
    };
    Ok(json)
}

impl AthleteArgs {
    fn filter(&self) -> anyhow::Result<AthleteFilter> {
        Ok(AthleteFilter::new(self.name.as_str())?
            .with_born(self.born.as_deref())
            .with_country(self.country.as_deref()))
    }
}

/// Ask for the athlete the way the report desk does: name, then optional
/// country and birth date.
fn prompt_athlete() -> anyhow::Result<Command> {
    let name: String = Input::new()
        .with_prompt("Athlete name")
        .interact_text()
        .context("Failed to read athlete name")?;

    let country = if Confirm::new()
        .with_prompt("Do you know the athlete's country?")
        .default(false)
        .interact()?
    {
        Some(
            Input::<String>::new()
                .with_prompt("Country")
                .interact_text()
                .context("Failed to read country")?,
        )
    } else {
        None
    };

    let born = if Confirm::new()
        .with_prompt("Do you know the athlete's birth date?")
        .default(false)
        .interact()?
    {
        Some(
            Input::<String>::new()
                .with_prompt("Birth date (YYYY-MM-DD)")
                .interact_text()
                .context("Failed to read birth date")?,
        )
    } else {
        None
    };

    Ok(Command::Report {
        athlete: AthleteArgs {
            name,
            born,
            country,
        },
        medals: MedalArgs {
            no_count: false,
            no_percent: false,
        },
    })
}
