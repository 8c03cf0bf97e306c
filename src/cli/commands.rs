use crate::api::KeepaliveClient;
use crate::config::LauncherConfig;
use crate::error::Result;
use crate::orchestrator::Orchestrator;
use crate::preflight;
use crate::probe::{TcpProbe, DEFAULT_ATTEMPTS, DEFAULT_CONNECT_TIMEOUT, DEFAULT_INTERVAL};
use crate::process::SystemLauncher;
use clap::{Args, Parser, Subcommand};
use colored::*;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

/// Starts Lavalink, waits for its control port, then hands over to the music bot
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub launch: LaunchArgs,

    /// Defaults to `run` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dependency, wait for it, then hand over to the bot
    Run(RunArgs),

    /// Print a preflight report of artifacts, binaries, secrets and ports
    Check {
        /// Emit the report as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Probe the bot's keepalive endpoint (exit 0 when healthy, 1 otherwise)
    Health(HealthArgs),
}

/// Settings shared by every subcommand. Flags win over environment variables.
#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Dependency archive; when missing the bot starts without it
    #[arg(long, global = true, env = "LAVALINK_JAR", default_value = "Lavalink.jar")]
    pub artifact: PathBuf,

    /// Dependency configuration file, relative to the archive's directory
    #[arg(long, global = true, env = "LAVALINK_CONFIG", default_value = "application.yml")]
    pub lavalink_config: PathBuf,

    /// Java executable used to run the archive
    #[arg(long, global = true, env = "JAVA_BIN", default_value = "java")]
    pub java: String,

    /// Extra JVM options, whitespace separated
    #[arg(long, global = true, env = "JAVA_OPTS", allow_hyphen_values = true)]
    pub java_opts: Option<String>,

    /// Host of the dependency's control port
    #[arg(long, global = true, env = "LAVALINK_HOST", default_value = "127.0.0.1")]
    pub probe_host: String,

    /// Dependency control port polled for readiness
    #[arg(long, global = true, env = "LAVALINK_PORT", default_value = "2333")]
    pub probe_port: u16,

    /// Maximum number of readiness probes
    #[arg(long, global = true, env = "LAVALINK_WAIT_ATTEMPTS", default_value_t = DEFAULT_ATTEMPTS)]
    pub attempts: u32,

    /// Delay between two probes, in milliseconds
    #[arg(
        long,
        global = true,
        env = "LAVALINK_WAIT_INTERVAL_MS",
        default_value_t = DEFAULT_INTERVAL.as_millis() as u64
    )]
    pub interval_ms: u64,

    /// Timeout of a single connection attempt, in milliseconds
    #[arg(
        long,
        global = true,
        env = "LAVALINK_CONNECT_TIMEOUT_MS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64
    )]
    pub connect_timeout_ms: u64,

    /// Main process command line, whitespace separated (default: "python3 bot.py")
    #[arg(long, global = true, env = "BOT_COMMAND")]
    pub bot_command: Option<String>,

    /// Keepalive port of the bot (falls back to PORT, then 8080)
    #[arg(long, global = true, env = "FLASK_PORT")]
    pub health_port: Option<u16>,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Print the launch report as JSON before handing over
    #[arg(long)]
    pub report: bool,

    /// Wait on the bot as a child instead of replacing the launcher with it
    #[arg(long)]
    pub no_exec: bool,

    /// Main process command line; overrides BOT_COMMAND
    #[arg(last = true)]
    pub command: Vec<String>,
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Keepalive URL (default: http://127.0.0.1:<health port>/)
    #[arg(long)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, default_value = "5")]
    pub timeout_secs: u64,
}

/// CLI application
pub struct App {
    cli: Cli,
    log_guard: Option<WorkerGuard>,
}

impl App {
    /// Create a new CLI application from parsed arguments.
    ///
    /// `log_guard` keeps the optional file logger alive; it is released right
    /// before the bot replaces the launcher.
    pub fn new(cli: Cli, log_guard: Option<WorkerGuard>) -> Self {
        Self { cli, log_guard }
    }

    /// Run the selected command and return the exit code for the process.
    pub async fn run(self) -> Result<u8> {
        let Self { cli, log_guard } = self;
        let command = cli.command.unwrap_or(Commands::Run(RunArgs::default()));

        match command {
            Commands::Run(args) => {
                let config = LauncherConfig::from_args(&cli.launch, &args.command)?;
                let launcher = SystemLauncher::new(!args.no_exec).with_log_guard(log_guard);
                let probe = TcpProbe::new(config.connect_timeout);

                Orchestrator::new(config, probe, launcher)
                    .with_spinner(std::io::stdout().is_terminal())
                    .with_report(args.report)
                    .run()
                    .await
            },
            Commands::Check { json } => {
                let config = LauncherConfig::from_args(&cli.launch, &[])?;
                let report = preflight::run_checks(&config).await;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    preflight::print_table(&report);
                }
                Ok(0)
            },
            Commands::Health(args) => {
                let config = LauncherConfig::from_args(&cli.launch, &[])?;
                let url = args.url.unwrap_or_else(|| config.health_url());
                let client = KeepaliveClient::new(Duration::from_secs(args.timeout_secs))?;

                match client.check(&url).await {
                    Ok(status) => {
                        info!("Keepalive at {} is healthy", url);
                        println!(
                            "{} {} (bot_user: {})",
                            "healthy:".green().bold(),
                            url,
                            status.bot_user.as_deref().unwrap_or("unknown")
                        );
                        Ok(0)
                    },
                    Err(e) => {
                        error!("Keepalive check against {} failed: {}", url, e);
                        println!("{} {}", "unhealthy:".red().bold(), e);
                        Ok(1)
                    },
                }
            },
        }
    }
}
