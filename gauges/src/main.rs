//! Gauges CLI - manage gauges, shares and API keys, and read traffic reports from the terminal.

mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use gauges_lib::{
    resolve_credentials, AddShare, AnalyticsQuery, Client, CreateClient, CreateGauge, Report,
    Response, UpdateGauge, UpdateUser,
};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gauges")]
#[command(about = "Gauges CLI - manage gauges and read traffic reports", long_about = None)]
struct Cli {
    /// Output format: plain (human-readable), json (status and body).
    #[arg(short, long, default_value = "plain", value_enum)]
    output: OutputFormatArg,

    /// API host; defaults to the public Gauges API.
    #[arg(long, env = "GAUGES_BASE_URL")]
    base_url: Option<String>,

    /// Log filter for stderr diagnostics (e.g. `debug`, `gauges_lib=trace`).
    #[arg(long, env = "GAUGES_LOG", default_value = "warn")]
    log_level: String,

    /// Exit non-zero when the API answers with a non-2xx status.
    #[arg(long)]
    fail: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    Plain,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportArg {
    Content,
    Referrers,
    Traffic,
    Resolutions,
    Technology,
    Terms,
    Engines,
    Locations,
}

impl From<ReportArg> for Report {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Content => Report::Content,
            ReportArg::Referrers => Report::Referrers,
            ReportArg::Traffic => Report::Traffic,
            ReportArg::Resolutions => Report::Resolutions,
            ReportArg::Technology => Report::Technology,
            ReportArg::Terms => Report::Terms,
            ReportArg::Engines => Report::Engines,
            ReportArg::Locations => Report::Locations,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current user
    Me,
    /// Update the current user
    UpdateMe {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// List API clients (keys)
    Clients,
    /// Create an API client
    CreateClient {
        /// What the key will be used for (e.g. HipChat)
        description: String,
    },
    /// Delete an API client by key
    DeleteClient { id: String },
    /// List gauges
    Gauges,
    /// Create a gauge
    CreateGauge {
        title: String,
        /// Time zone, e.g. "Eastern Time (US & Canada)"
        #[arg(long)]
        tz: String,
        /// Domain of the site
        #[arg(long)]
        service_value: Option<String>,
        #[arg(long)]
        allowed_hosts: Option<String>,
    },
    /// Show one gauge
    Gauge { id: String },
    /// Update a gauge; only the given fields change
    UpdateGauge {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        tz: Option<String>,
        #[arg(long)]
        service_value: Option<String>,
        #[arg(long)]
        allowed_hosts: Option<String>,
    },
    /// Delete a gauge
    DeleteGauge { id: String },
    /// List users and invites with access to a gauge
    Shares { id: String },
    /// Share a gauge with a user or invite an email address
    Share { id: String, email: String },
    /// Remove a user's access to a gauge
    Unshare { id: String, user_id: String },
    /// Read an analytics report for a gauge
    Report {
        #[arg(value_enum)]
        report: ReportArg,
        id: String,
        #[arg(long)]
        page: Option<u32>,
        /// Day to report on (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// GET a link from a previous response (e.g. urls.older)
    Resolve { url: String },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Version) {
        println!("gauges {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    if let Err(e) = check_report_flags(&cli.command) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = init_logging(&cli.log_level) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let client = match build_client(cli.base_url.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let format = match cli.output {
        OutputFormatArg::Plain => output::OutputFormat::Plain,
        OutputFormatArg::Json => output::OutputFormat::Json,
    };

    match run(&client, cli.command).await {
        Ok(None) => ExitCode::SUCCESS,
        Ok(Some(res)) => {
            match output::render(&res, format) {
                Ok(text) => print!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            if cli.fail && !res.is_success() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("warn"))
        .map_err(|e| format!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| e.to_string())
}

/// `terms` has no pages or days; refuse the flags instead of dropping them.
fn check_report_flags(cmd: &Commands) -> Result<(), String> {
    if let Commands::Report {
        report, page, date, ..
    } = cmd
    {
        let report = Report::from(*report);
        if !report.takes_query() && (page.is_some() || date.is_some()) {
            return Err(format!(
                "the {} report does not accept --page or --date",
                report.as_str()
            ));
        }
    }
    Ok(())
}

fn build_client(base_url: Option<&str>) -> Result<Client, gauges_lib::Error> {
    let (credentials, source) = resolve_credentials()?;
    debug!(?source, mode = ?credentials.mode(), "Resolved credentials");
    let client = Client::new(credentials)?;
    match base_url {
        Some(url) => client.with_base_url(url),
        None => Ok(client),
    }
}

async fn run(client: &Client, cmd: Commands) -> Result<Option<Response>, gauges_lib::Error> {
    let res = match cmd {
        Commands::Me => client.me().await,
        Commands::UpdateMe {
            first_name,
            last_name,
            email,
        } => {
            let params = UpdateUser {
                first_name,
                last_name,
                email,
            };
            client.update_me(&params).await
        }
        Commands::Clients => client.clients().await,
        Commands::CreateClient { description } => {
            client.create_client(&CreateClient::new(description)).await
        }
        Commands::DeleteClient { id } => client.delete_client(&id).await,
        Commands::Gauges => client.gauges().await,
        Commands::CreateGauge {
            title,
            tz,
            service_value,
            allowed_hosts,
        } => {
            let params = CreateGauge {
                title,
                tz,
                service_value,
                allowed_hosts,
            };
            client.create_gauge(&params).await
        }
        Commands::Gauge { id } => client.gauge(&id).await,
        Commands::UpdateGauge {
            id,
            title,
            tz,
            service_value,
            allowed_hosts,
        } => {
            let params = UpdateGauge {
                title,
                tz,
                service_value,
                allowed_hosts,
            };
            client.update_gauge(&id, &params).await
        }
        Commands::DeleteGauge { id } => client.delete_gauge(&id).await,
        Commands::Shares { id } => client.shares(&id).await,
        Commands::Share { id, email } => client.share(&id, &AddShare::new(email)).await,
        Commands::Unshare { id, user_id } => client.unshare(&id, &user_id).await,
        Commands::Report {
            report,
            id,
            page,
            date,
        } => {
            client
                .report(&id, report.into(), AnalyticsQuery { page, date })
                .await
        }
        Commands::Resolve { url } => client.resolve_by_url(&url).await,
        Commands::Version => return Ok(None),
    };
    res.map(Some)
}
