mod config;
mod output;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use redrive::{SqsService, TopologyReporter};

use crate::config::{non_empty, AwsArgs};

#[tokio::main]
pub async fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,redrive=info"),
    )
    .init();

    match Cli::parse().run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "redrive")]
#[command(about = "aws sqs dead letter queue topology CLI written in rust", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    aws: AwsArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Send a message to a queue
    Send {
        #[arg(long, env = "REDRIVE_QUEUE_URL")]
        queue_url: String,
        #[arg(long, env = "REDRIVE_MESSAGE")]
        message: String,
    },
    /// List every queue in the region
    List {
        /// Only list queues whose name starts with this prefix
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Show each queue and the dead letter queue it redrives into
    Report(ReportArgs),
    /// List the queues that redrive into a dead letter queue
    Sources { dlq_url: String },
    /// Send a message, report the topology, then list a DLQ's source queues
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct ReportArgs {
    /// Only report queues whose name starts with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Attribute requests in flight at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
    concurrency: u16,

    /// Print one JSON object per queue instead of text
    #[arg(long, action)]
    json: bool,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Queue to send `--message` to; the send step is skipped without both
    #[arg(long, env = "REDRIVE_QUEUE_URL")]
    queue_url: Option<String>,

    #[arg(long, env = "REDRIVE_MESSAGE")]
    message: Option<String>,

    /// Dead letter queue whose source queues are listed last
    #[arg(long, env = "REDRIVE_DLQ_URL")]
    dlq_url: Option<String>,

    #[command(flatten)]
    report: ReportArgs,
}

impl Commands {
    /// Fields this command needs that were given empty or left out.
    fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            Commands::Send { queue_url, message } => {
                if non_empty(Some(queue_url)).is_none() {
                    missing.push("queue-url");
                }
                if non_empty(Some(message)).is_none() {
                    missing.push("message");
                }
            }
            Commands::Sources { dlq_url } => {
                if non_empty(Some(dlq_url)).is_none() {
                    missing.push("dlq-url");
                }
            }
            Commands::Run(args) => {
                let queue_url = non_empty(args.queue_url.as_deref());
                let message = non_empty(args.message.as_deref());
                match (queue_url, message) {
                    (Some(_), None) => missing.push("message"),
                    (None, Some(_)) => missing.push("queue-url"),
                    _ => {}
                }
            }
            Commands::List { .. } | Commands::Report(_) => {}
        }
        missing
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let settings = self.aws.settings(self.command.missing_fields()).await?;
        let service = SqsService::from_config(settings.load().await?);
        log::info!("using region {}", settings.region);

        let mut stdout = std::io::stdout();
        match self.command {
            Commands::Send { queue_url, message } => {
                send(&service, &queue_url, &message, &mut stdout).await?
            }
            Commands::List { prefix } => {
                let queues = redrive::list_all_queues(&service, prefix.as_deref())
                    .await
                    .context("error listing queues")?;
                output::queues(&mut stdout, &queues)?;
            }
            Commands::Report(args) => report(service, &args, &mut stdout).await?,
            Commands::Sources { dlq_url } => sources(service, &dlq_url, &mut stdout).await?,
            Commands::Run(args) => return Ok(run_all(service, args, &mut stdout).await),
        }

        Ok(ExitCode::SUCCESS)
    }
}

async fn send(
    service: &SqsService,
    queue_url: &str,
    message: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let message_id = redrive::send_message(service, queue_url.trim(), message)
        .await
        .context("error sending message")?;
    writeln!(out, "Message sent successfully! (id: {message_id})")?;
    Ok(())
}

async fn report(
    service: SqsService,
    args: &ReportArgs,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut reporter = TopologyReporter::new(service).with_concurrency(args.concurrency.into());
    if let Some(prefix) = non_empty(args.prefix.as_deref()) {
        reporter = reporter.with_prefix(prefix);
    }

    let report = reporter
        .report_topology()
        .await
        .context("error listing queues and DLQs")?;

    if args.json {
        output::report_json(out, &report)?;
    } else {
        output::report(out, &report)?;
    }
    Ok(())
}

async fn sources(service: SqsService, dlq_url: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let sources = TopologyReporter::new(service)
        .list_sources_for_dead_letter_queue(dlq_url.trim())
        .await
        .context("error listing source queues for DLQ")?;
    output::sources(out, dlq_url.trim(), &sources)?;
    Ok(())
}

/// Runs send, report and reverse lookup in turn. A failing step is reported
/// and the next one still runs; any failure makes the exit status non-zero.
async fn run_all(service: SqsService, args: RunArgs, out: &mut impl Write) -> ExitCode {
    let mut failed = false;
    let mut check = |step: anyhow::Result<()>| {
        if let Err(e) = step {
            eprintln!("error: {:#}", e);
            failed = true;
        }
    };

    let message = args.message.as_deref().filter(|m| !m.trim().is_empty());
    match (non_empty(args.queue_url.as_deref()), message) {
        (Some(queue_url), Some(message)) => {
            check(send(&service, queue_url, message, out).await);
        }
        _ => check(writeln!(out, "No queue URL provided, skipping send.").map_err(Into::into)),
    }

    check(report(service.clone(), &args.report, out).await);

    match non_empty(args.dlq_url.as_deref()) {
        Some(dlq_url) => check(sources(service, dlq_url, out).await),
        None => check(
            writeln!(out, "\nNo DLQ URL provided for source queue check.").map_err(Into::into),
        ),
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
