use crate::config::LauncherConfig;
use crate::models::PreflightReport;
use crate::probe::{ReadinessProbe, TcpProbe};
use crate::process::resolve_program;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use std::env;
use tracing::info;

/// Collects every preflight check. Never fails: problems become rows with `ok == false`.
pub async fn run_checks(config: &LauncherConfig) -> PreflightReport {
    let mut report = PreflightReport::default();

    let artifact = config.artifact.display().to_string();
    if config.artifact.is_file() {
        report.push("Lavalink archive", true, artifact);
    } else {
        report.push(
            "Lavalink archive",
            false,
            format!("{} missing, the bot would start without Lavalink", artifact),
        );
    }

    let lavalink_config = config.lavalink_config.display().to_string();
    let config_ok = config.lavalink_config.is_file();
    report.push(
        "Lavalink config",
        config_ok,
        if config_ok {
            lavalink_config
        } else {
            format!("{} missing", lavalink_config)
        },
    );

    push_program(&mut report, "Java runtime", &config.java);
    push_program(&mut report, "Bot program", &config.main_command.program);

    // Only presence is reported, the token itself never leaves the environment.
    let token_set = env::var_os("DISCORD_TOKEN").is_some_and(|token| !token.is_empty());
    report.push(
        "DISCORD_TOKEN",
        token_set,
        if token_set { "set" } else { "not set" },
    );

    let listening = TcpProbe::new(config.connect_timeout)
        .check(&config.target)
        .await;
    report.push(
        "Lavalink port",
        listening,
        if listening {
            format!("{} is accepting connections", config.target)
        } else {
            format!("nothing listening on {}", config.target)
        },
    );

    info!(
        "Preflight finished: {}/{} checks passed",
        report.items.iter().filter(|item| item.ok).count(),
        report.items.len()
    );
    report
}

fn push_program(report: &mut PreflightReport, name: &str, program: &str) {
    match resolve_program(program) {
        Some(path) => report.push(name, true, path.display().to_string()),
        None => report.push(name, false, format!("'{}' not found", program)),
    }
}

/// Renders the report as a table on stdout.
pub fn print_table(report: &PreflightReport) {
    println!("{}", render_table(report));
    if report.all_ok() {
        println!("{}", "All checks passed.".green());
    } else {
        println!(
            "{}",
            "Some checks failed; the launcher still starts the bot, possibly degraded.".yellow()
        );
    }
}

fn render_table(report: &PreflightReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Check", "Status", "Detail"]);

    for item in &report.items {
        let status = if item.ok {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("missing").fg(Color::Yellow)
        };
        table.add_row(vec![Cell::new(&item.name), status, Cell::new(&item.detail)]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProbeTarget;
    use crate::probe::PollPolicy;
    use crate::process::CommandSpec;
    use serial_test::serial;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::net::TcpListener;

    fn config(dir: &Path, port: u16) -> LauncherConfig {
        LauncherConfig {
            artifact: dir.join("Lavalink.jar"),
            lavalink_config: dir.join("application.yml"),
            java: "definitely-not-a-real-java-4711".to_string(),
            java_opts: Vec::new(),
            target: ProbeTarget::new("127.0.0.1", port),
            policy: PollPolicy::default(),
            connect_timeout: Duration::from_millis(200),
            main_command: CommandSpec::new("sh").arg("bot.sh"),
            health_port: 8080,
        }
    }

    fn item<'a>(report: &'a PreflightReport, name: &str) -> &'a crate::models::PreflightItem {
        report
            .items
            .iter()
            .find(|item| item.name == name)
            .unwrap_or_else(|| panic!("missing preflight row {}", name))
    }

    #[tokio::test]
    #[serial]
    async fn test_preflight_with_everything_present() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Lavalink.jar"), b"PK").unwrap();
        fs::write(dir.path().join("application.yml"), b"server:\n  port: 2333\n").unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        env::set_var("DISCORD_TOKEN", "super-secret-token");

        let report = run_checks(&config(dir.path(), port)).await;
        env::remove_var("DISCORD_TOKEN");

        assert!(item(&report, "Lavalink archive").ok);
        assert!(item(&report, "Lavalink config").ok);
        assert!(!item(&report, "Java runtime").ok);
        assert!(item(&report, "Lavalink port").ok);

        let token = item(&report, "DISCORD_TOKEN");
        assert!(token.ok);
        assert_eq!(token.detail, "set");
        assert!(!report
            .items
            .iter()
            .any(|item| item.detail.contains("super-secret-token")));

        #[cfg(unix)]
        assert!(item(&report, "Bot program").ok);
    }

    #[tokio::test]
    #[serial]
    async fn test_preflight_reports_missing_pieces() {
        let dir = TempDir::new().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        env::remove_var("DISCORD_TOKEN");

        let report = run_checks(&config(dir.path(), port)).await;

        assert!(!report.all_ok());
        assert!(item(&report, "Lavalink archive").detail.contains("missing"));
        assert!(!item(&report, "Lavalink config").ok);
        assert_eq!(item(&report, "DISCORD_TOKEN").detail, "not set");
        assert!(!item(&report, "Lavalink port").ok);
        assert!(item(&report, "Java runtime").detail.contains("not found"));
    }

    #[test]
    fn test_render_table_has_one_row_per_item() {
        let mut report = PreflightReport::default();
        report.push("Lavalink archive", true, "Lavalink.jar");
        report.push("DISCORD_TOKEN", false, "not set");

        let rendered = render_table(&report).to_string();

        assert!(rendered.contains("Lavalink archive"));
        assert!(rendered.contains("not set"));
        assert_eq!(render_table(&report).row_iter().count(), 2);
    }
}
