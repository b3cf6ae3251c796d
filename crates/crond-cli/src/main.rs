use anyhow::Context;
use clap::{Parser, Subcommand};

use crond_core::api::{
    CreateOrReplaceRequest, EntriesResponse, EntryIdResponse, EntryView, NameRequest,
    PauseRequest, ScheduleChangeRequest, StatusFilter,
};
use crond_core::{CrondConfig, JobDefine};

mod client;

use client::Client;

#[derive(Parser)]
#[command(name = "crondctl", version, about = "Control a running crond over its HTTP API")]
struct Cli {
    /// Runtime config of the daemon, read for its listen address.
    #[arg(long, env = "CROND_CONFIG", global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add a job, or replace the one with the same name.
    #[command(alias = "addJob")]
    AddJob {
        #[arg(short, long)]
        name: String,
        /// Executable to run.
        #[arg(long = "command", short = 'c')]
        cmd: String,
        /// Argument passed to the command; repeat for more.
        #[arg(short, long = "arg")]
        args: Vec<String>,
        #[arg(short, long)]
        schedule: String,
        #[arg(long, default_value = "")]
        creator: String,
        #[arg(long)]
        work_dir: Option<String>,
        /// Register the job disabled.
        #[arg(long)]
        disabled: bool,
        #[arg(short, long)]
        permanent: bool,
    },
    /// Delete a job.
    #[command(alias = "delJob")]
    DelJob {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        permanent: bool,
    },
    /// Take an active job off the schedule.
    #[command(alias = "disableJob")]
    DisableJob {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        permanent: bool,
    },
    /// Put a disabled or paused job back on the schedule.
    #[command(alias = "enableJob")]
    EnableJob {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        permanent: bool,
    },
    /// Suspend an active job for a while, e.g. `--duration 2h`.
    #[command(alias = "pauseJob")]
    PauseJob {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        duration: String,
    },
    /// Give an active job a new schedule.
    #[command(alias = "changeJob")]
    ChangeJob {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        schedule: String,
        #[arg(short, long)]
        permanent: bool,
    },
    /// List jobs.
    List {
        #[arg(short, long)]
        name: Option<String>,
        /// Regular expression on the job name.
        #[arg(short = 'm', long)]
        name_match: Option<String>,
        #[arg(long, value_enum, default_value = "enabled")]
        status: Status,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Status {
    Enabled,
    Disabled,
    All,
}

impl From<Status> for StatusFilter {
    fn from(s: Status) -> Self {
        match s {
            Status::Enabled => StatusFilter::Enabled,
            Status::Disabled => StatusFilter::Disabled,
            Status::All => StatusFilter::All,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = CrondConfig::load(cli.config.as_deref()).context("reading crond config")?;
    let client = Client::new(&config.listen_addr())?;

    let reply: EntryIdResponse = match cli.command {
        Command::AddJob {
            name,
            cmd,
            args,
            schedule,
            creator,
            work_dir,
            disabled,
            permanent,
        } => {
            let job = JobDefine {
                name,
                command: cmd,
                args,
                schedule,
                creator,
                enable: Some(!disabled),
                work_dir,
            };
            client
                .post("/create_or_replace", &CreateOrReplaceRequest { job, permanent })
                .await?
        }
        Command::DelJob { name, permanent } => {
            client.post("/delete", &NameRequest { name, permanent }).await?
        }
        Command::DisableJob { name, permanent } => {
            client.post("/disable", &NameRequest { name, permanent }).await?
        }
        Command::EnableJob { name, permanent } => {
            client.post("/resume", &NameRequest { name, permanent }).await?
        }
        Command::PauseJob { name, duration } => {
            client.post("/pause", &PauseRequest { name, duration }).await?
        }
        Command::ChangeJob {
            name,
            schedule,
            permanent,
        } => {
            client
                .post(
                    "/schedule/change",
                    &ScheduleChangeRequest {
                        name,
                        schedule,
                        permanent,
                    },
                )
                .await?
        }
        Command::List {
            name,
            name_match,
            status,
        } => {
            let mut query = vec![("status", status_param(status.into()))];
            query.extend(name.map(|n| ("name", n)));
            query.extend(name_match.map(|m| ("name-match", m)));
            let listing: EntriesResponse = client.get("/entries", &query).await?;
            print_entries(&listing.entries);
            return Ok(());
        }
    };

    println!("entry_id: {}", reply.entry_id);
    Ok(())
}

fn status_param(status: StatusFilter) -> String {
    match status {
        StatusFilter::Enabled => "enabled",
        StatusFilter::Disabled => "disabled",
        StatusFilter::All => "all",
    }
    .to_string()
}

fn print_entries(entries: &[EntryView]) {
    println!(
        "{:<6} {:<9} {:<24} {:<20} {:<20} COMMAND",
        "ID", "STATUS", "NAME", "SCHEDULE", "NEXT"
    );
    for e in entries {
        let next = e
            .next
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let command = std::iter::once(e.job.command.as_str())
            .chain(e.job.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        println!(
            "{:<6} {:<9} {:<24} {:<20} {:<20} {}",
            e.id,
            e.status.to_string(),
            e.job.name,
            e.job.schedule,
            next,
            command
        );
    }
}
