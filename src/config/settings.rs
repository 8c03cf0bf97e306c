//! The resolved launcher configuration.
//!
//! Every value comes from a CLI flag with an environment fallback (see
//! `cli::LaunchArgs`); `.env` is loaded by `main` before parsing so it feeds the
//! same fallbacks. This module validates the combination and derives the two
//! command lines and the probe target.

use crate::cli::LaunchArgs;
use crate::error::{AppError, Result};
use crate::models::ProbeTarget;
use crate::probe::PollPolicy;
use crate::process::CommandSpec;
use std::env::{self, VarError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main process used when neither a trailing command nor `BOT_COMMAND` is given.
pub const DEFAULT_BOT_COMMAND: &str = "python3 bot.py";
/// Keepalive port used when neither `FLASK_PORT` nor `PORT` is set.
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Fully validated settings for one launcher run.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    /// Dependency archive; its absence means "run degraded".
    pub artifact: PathBuf,
    /// Dependency configuration file, resolved against the artifact's directory.
    pub lavalink_config: PathBuf,
    pub java: String,
    pub java_opts: Vec<String>,
    pub target: ProbeTarget,
    pub policy: PollPolicy,
    pub connect_timeout: Duration,
    pub main_command: CommandSpec,
    pub health_port: u16,
}

impl LauncherConfig {
    /// Builds the configuration from parsed arguments.
    ///
    /// `trailing` is the command given after `--`; it wins over `BOT_COMMAND`.
    pub fn from_args(args: &LaunchArgs, trailing: &[String]) -> Result<Self> {
        if args.probe_port == 0 {
            return Err(AppError::Config(
                "probe port must be non-zero".to_string(),
            ));
        }
        if args.attempts > 0 && args.interval_ms == 0 {
            return Err(AppError::Config(
                "polling interval must be at least 1 ms".to_string(),
            ));
        }

        let main_command = if trailing.is_empty() {
            let line = args.bot_command.as_deref().unwrap_or(DEFAULT_BOT_COMMAND);
            CommandSpec::from_words(line.split_whitespace())
        } else {
            CommandSpec::from_words(trailing.iter().cloned())
        };
        let main_command = main_command
            .ok_or_else(|| AppError::Config("bot command must not be empty".to_string()))?;

        let java = args.java.trim().to_string();
        if java.is_empty() {
            return Err(AppError::Config("java binary must not be empty".to_string()));
        }

        let health_port = match args.health_port {
            Some(port) => port,
            None => fallback_health_port()?,
        };

        let config = Self {
            lavalink_config: resolve_beside(&args.artifact, &args.lavalink_config),
            artifact: args.artifact.clone(),
            java,
            java_opts: args
                .java_opts
                .as_deref()
                .map(|opts| opts.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            target: ProbeTarget::new(normalize_host(&args.probe_host), args.probe_port),
            policy: PollPolicy {
                attempts: args.attempts,
                interval: Duration::from_millis(args.interval_ms),
            },
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            main_command,
            health_port,
        };

        debug!("Resolved launcher configuration: {:?}", config);
        Ok(config)
    }

    /// `<java> <opts...> -jar <artifact>`, run from the artifact's directory so the
    /// dependency picks up its `application.yml`.
    pub fn dependency_command(&self) -> CommandSpec {
        let jar = self
            .artifact
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.artifact.to_string_lossy().into_owned());

        let spec = CommandSpec::new(&self.java)
            .args(self.java_opts.iter().cloned())
            .arg("-jar")
            .arg(jar);

        match artifact_dir(&self.artifact) {
            Some(dir) => spec.current_dir(dir),
            None => spec,
        }
    }

    /// Default keepalive URL of the main process.
    pub fn health_url(&self) -> String {
        format!("http://127.0.0.1:{}/", self.health_port)
    }
}

/// `FLASK_PORT` is handled by clap; this covers the `PORT` fallback.
fn fallback_health_port() -> Result<u16> {
    match env::var("PORT") {
        Ok(value) => value.trim().parse::<u16>().map_err(|e| {
            AppError::Config(format!("PORT must be a valid port number ({}): {}", value, e))
        }),
        Err(VarError::NotPresent) => Ok(DEFAULT_HEALTH_PORT),
        Err(e) => Err(e.into()),
    }
}

/// `localhost` may resolve to `::1` first while the dependency binds IPv4 only.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.is_empty() || host.eq_ignore_ascii_case("localhost") {
        "127.0.0.1".to_string()
    } else {
        host.to_string()
    }
}

fn artifact_dir(artifact: &Path) -> Option<&Path> {
    artifact.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn resolve_beside(artifact: &Path, file: &Path) -> PathBuf {
    match artifact_dir(artifact) {
        Some(dir) if file.is_relative() => dir.join(file),
        _ => file.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use rstest::rstest;
    use serial_test::serial;

    const ENV_KEYS: [&str; 12] = [
        "LAVALINK_JAR",
        "LAVALINK_CONFIG",
        "JAVA_BIN",
        "JAVA_OPTS",
        "LAVALINK_HOST",
        "LAVALINK_PORT",
        "LAVALINK_WAIT_ATTEMPTS",
        "LAVALINK_WAIT_INTERVAL_MS",
        "LAVALINK_CONNECT_TIMEOUT_MS",
        "BOT_COMMAND",
        "FLASK_PORT",
        "PORT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    fn config_for(argv: &[&str]) -> Result<LauncherConfig> {
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        let trailing = match &cli.command {
            Some(Commands::Run(run)) => run.command.clone(),
            _ => Vec::new(),
        };
        LauncherConfig::from_args(&cli.launch, &trailing)
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = config_for(&["musicbot-launcher"]).unwrap();

        assert_eq!(config.artifact, PathBuf::from("Lavalink.jar"));
        assert_eq!(config.lavalink_config, PathBuf::from("application.yml"));
        assert_eq!(config.target, ProbeTarget::new("127.0.0.1", 2333));
        assert_eq!(config.policy, PollPolicy::default());
        assert_eq!(config.connect_timeout, Duration::from_millis(500));
        assert_eq!(config.main_command.to_string(), DEFAULT_BOT_COMMAND);
        assert_eq!(config.health_port, DEFAULT_HEALTH_PORT);
        assert_eq!(config.health_url(), "http://127.0.0.1:8080/");

        let dep = config.dependency_command();
        assert_eq!(dep.to_string(), "java -jar Lavalink.jar");
        assert!(dep.working_dir.is_none());
    }

    #[test]
    #[serial]
    fn test_env_fallbacks() {
        clear_env();
        env::set_var("LAVALINK_HOST", "localhost");
        env::set_var("LAVALINK_PORT", "2444");
        env::set_var("LAVALINK_WAIT_ATTEMPTS", "5");
        env::set_var("JAVA_OPTS", "-Xmx512m  -Dfoo=bar");
        env::set_var("BOT_COMMAND", "python3 musicbot_247_flask.py");
        env::set_var("PORT", "10000");

        let result = config_for(&["musicbot-launcher"]);
        clear_env();
        let config = result.unwrap();

        assert_eq!(config.target, ProbeTarget::new("127.0.0.1", 2444));
        assert_eq!(config.policy.attempts, 5);
        assert_eq!(config.java_opts, vec!["-Xmx512m", "-Dfoo=bar"]);
        assert_eq!(config.main_command.program, "python3");
        assert_eq!(config.main_command.args, vec!["musicbot_247_flask.py"]);
        assert_eq!(config.health_port, 10000);
        assert_eq!(
            config.dependency_command().to_string(),
            "java -Xmx512m -Dfoo=bar -jar Lavalink.jar"
        );
    }

    #[test]
    #[serial]
    fn test_flask_port_wins_over_port() {
        clear_env();
        env::set_var("FLASK_PORT", "5000");
        env::set_var("PORT", "10000");

        let result = config_for(&["musicbot-launcher"]);
        clear_env();

        assert_eq!(result.unwrap().health_port, 5000);
    }

    #[test]
    #[serial]
    fn test_flags_override_env_and_trailing_command_wins() {
        clear_env();
        env::set_var("LAVALINK_PORT", "2444");
        env::set_var("BOT_COMMAND", "python3 bot.py");

        let result = config_for(&[
            "musicbot-launcher",
            "--probe-port",
            "2555",
            "--artifact",
            "lavalink/Lavalink.jar",
            "run",
            "--",
            "python3",
            "-u",
            "main.py",
        ]);
        clear_env();
        let config = result.unwrap();

        assert_eq!(config.target.port, 2555);
        assert_eq!(config.main_command.to_string(), "python3 -u main.py");
        assert_eq!(
            config.lavalink_config,
            PathBuf::from("lavalink").join("application.yml")
        );

        let dep = config.dependency_command();
        assert_eq!(dep.to_string(), "java -jar Lavalink.jar");
        assert_eq!(dep.working_dir, Some(PathBuf::from("lavalink")));
    }

    #[rstest]
    #[case(&["musicbot-launcher", "--probe-port", "0"], "probe port")]
    #[case(&["musicbot-launcher", "--interval-ms", "0"], "polling interval")]
    #[case(&["musicbot-launcher", "--bot-command", "   "], "bot command")]
    #[case(&["musicbot-launcher", "--java", ""], "java binary")]
    #[serial]
    fn test_invalid_settings(#[case] argv: &[&str], #[case] needle: &str) {
        clear_env();
        match config_for(argv) {
            Err(AppError::Config(msg)) => assert!(msg.contains(needle), "{}", msg),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_zero_attempts_allows_zero_interval() {
        clear_env();
        let config =
            config_for(&["musicbot-launcher", "--attempts", "0", "--interval-ms", "0"]).unwrap();
        assert_eq!(config.policy.attempts, 0);
    }

    #[test]
    #[serial]
    fn test_invalid_port_env() {
        clear_env();
        env::set_var("PORT", "not-a-port");
        let result = config_for(&["musicbot-launcher"]);
        clear_env();
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[rstest]
    #[case("localhost", "127.0.0.1")]
    #[case("LOCALHOST", "127.0.0.1")]
    #[case("", "127.0.0.1")]
    #[case("lavalink", "lavalink")]
    #[case(" 10.0.0.5 ", "10.0.0.5")]
    fn test_normalize_host(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_host(input), expected);
    }
}
