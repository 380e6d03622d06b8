//! mcpdoctor - MCP configuration doctor
//!
//! Usage:
//!   mcpdoctor                      # Full JSON report for the current project
//!   mcpdoctor --section health     # Only health verdicts (plus meta/summary)
//!   mcpdoctor --project-dir ../app # Inspect another project

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcpdoctor_core::config::load_doctor_config;
use mcpdoctor_core::context::DoctorContext;
use mcpdoctor_core::error::{DoctorError, DoctorResult};
use mcpdoctor_core::section::Section;
use mcpdoctor_core::status::collect_report;

#[derive(Parser, Debug)]
#[command(name = "mcpdoctor", version)]
#[command(about = "Inspect, merge and health-check MCP server configuration", long_about = None)]
struct Cli {
    /// Report section: all, config, servers, health, settings
    #[arg(long, short, default_value = "all")]
    section: String,

    /// Project root to inspect (default: nearest VCS root above the current directory)
    #[arg(long, short = 'p', value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Tool config file (default: <config dir>/mcpdoctor/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip network probes of remote servers
    #[arg(long)]
    offline: bool,

    /// Do not capture the external CLI server list
    #[arg(long)]
    no_cli_inventory: bool,

    /// Print JSON on one line
    #[arg(long)]
    compact: bool,

    /// Debug logging on stderr
    #[arg(long, short)]
    verbose: bool,
}

/// Why argument parsing did not yield a run.
#[derive(Debug)]
enum EarlyExit {
    /// `--help` or `--version`: print and succeed.
    Display(clap::Error),
    Invalid(DoctorError),
}

fn parse_cli<I, T>(args: I) -> Result<Cli, EarlyExit>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EarlyExit::Display(e),
        _ => {
            let rendered = e.to_string();
            let message = first_line(&rendered)
                .trim_start_matches("error: ")
                .to_string();
            EarlyExit::Invalid(DoctorError::InvalidArguments(message))
        }
    })
}

fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(EarlyExit::Display(e)) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(EarlyExit::Invalid(e)) => return fail(e),
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mcpdoctor=debug,mcpdoctor_core=debug,warn"
    } else {
        "mcpdoctor=warn,mcpdoctor_core=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> DoctorResult<String> {
    let config = load_doctor_config(cli.config.as_deref())?;
    let ctx = DoctorContext::detect(cli.project_dir.as_deref(), config)?
        .offline(cli.offline)
        .cli_inventory(!cli.no_cli_inventory);
    let section = Section::parse(&cli.section);

    tracing::debug!(
        project_root = %ctx.project_root().display(),
        section = %section,
        "starting run"
    );

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| DoctorError::Preflight(format!("failed to start async runtime: {e}")))?;
    let report = runtime.block_on(collect_report(&ctx));

    let view = report.project(section);
    let output = if cli.compact {
        serde_json::to_string(&view)?
    } else {
        serde_json::to_string_pretty(&view)?
    };
    Ok(output)
}

fn fail(error: DoctorError) -> ExitCode {
    println!("{}", error.to_json());
    ExitCode::from(error.exit_code() as u8)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mcpdoctor"]).unwrap();
        assert_eq!(cli.section, "all");
        assert!(cli.project_dir.is_none());
        assert!(!cli.offline);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        let err = Cli::try_parse_from(["mcpdoctor", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_missing_value_rejected() {
        assert!(Cli::try_parse_from(["mcpdoctor", "--project-dir"]).is_err());
    }

    #[test]
    fn test_bogus_flag_becomes_error_object() {
        let Err(EarlyExit::Invalid(error)) = parse_cli(["mcpdoctor", "--bogus"]) else {
            panic!("expected an invalid-arguments error");
        };
        let json = error.to_json();
        assert_eq!(json["error"]["kind"], "invalid_arguments");
        assert!(json["error"]["message"].as_str().unwrap().contains("--bogus"));
        assert_eq!(error.exit_code(), 2);
        assert_eq!(fail(error), ExitCode::from(2));
    }

    #[test]
    fn test_missing_value_becomes_error_object() {
        let Err(EarlyExit::Invalid(error)) = parse_cli(["mcpdoctor", "--project-dir"]) else {
            panic!("expected an invalid-arguments error");
        };
        assert_eq!(error.kind(), "invalid_arguments");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_help_is_not_an_error() {
        assert!(matches!(
            parse_cli(["mcpdoctor", "--help"]),
            Err(EarlyExit::Display(_))
        ));
        assert!(matches!(
            parse_cli(["mcpdoctor", "--version"]),
            Err(EarlyExit::Display(_))
        ));
    }

    #[test]
    fn test_missing_config_file_exits_one() {
        let cli = parse_cli([
            "mcpdoctor",
            "--config",
            "/definitely/not/here/mcpdoctor.toml",
        ])
        .unwrap();
        let error = run(cli).unwrap_err();
        assert_eq!(error.kind(), "config");
        assert_eq!(fail(error), ExitCode::from(1));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "mcpdoctor",
            "--section",
            "health",
            "-p",
            "/tmp",
            "--offline",
            "--no-cli-inventory",
            "--compact",
        ])
        .unwrap();
        assert_eq!(Section::parse(&cli.section), Section::Health);
        assert_eq!(cli.project_dir, Some(PathBuf::from("/tmp")));
        assert!(cli.no_cli_inventory && cli.compact);
    }
}
