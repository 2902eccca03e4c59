use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flatcopy_fs::{
    CancelToken, EnumCopyFileConflictStrategy, EnumCopyPatternMode, FileSelector, ReportCopy,
    SelectorExtensions, SelectorPatterns, SpecCopyOptions, copy_tree,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatcopy")]
#[command(
    about = "Recursively copy files while encoding their directory hierarchy into file names"
)]
#[command(version)]
struct Cli {
    #[arg(help = "Source directory path")]
    src_dir: PathBuf,

    #[arg(help = "Destination directory path (created if missing)")]
    dest_dir: PathBuf,

    #[arg(
        long,
        env = "FLATCOPY_INCLUDE",
        value_delimiter = ',',
        help = "Include pattern on file names (default selector: *.md, *.rst)"
    )]
    include: Vec<String>,

    #[arg(
        long,
        env = "FLATCOPY_EXCLUDE",
        value_delimiter = ',',
        help = "Exclude pattern on file names"
    )]
    exclude: Vec<String>,

    #[arg(
        long,
        env = "FLATCOPY_PATTERN_MODE",
        value_enum,
        default_value_t = PatternMode::Glob,
        help = "How --include/--exclude are interpreted"
    )]
    pattern_mode: PatternMode,

    #[arg(
        long,
        env = "FLATCOPY_ON_CONFLICT",
        value_enum,
        default_value_t = OnConflict::Overwrite,
        help = "What to do when the flat name already exists"
    )]
    on_conflict: OnConflict,

    #[arg(
        long,
        env = "FLATCOPY_SEPARATOR",
        default_value_t = '_',
        help = "Character joining directory names into the file name"
    )]
    separator: char,

    #[arg(long, env = "FLATCOPY_DRY_RUN", help = "Show what would be copied")]
    dry_run: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PatternMode {
    Glob,
    Regex,
    Literal,
}

impl From<PatternMode> for EnumCopyPatternMode {
    fn from(value: PatternMode) -> Self {
        match value {
            PatternMode::Glob => Self::Glob,
            PatternMode::Regex => Self::Regex,
            PatternMode::Literal => Self::Literal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OnConflict {
    Overwrite,
    Skip,
    Error,
}

impl From<OnConflict> for EnumCopyFileConflictStrategy {
    fn from(value: OnConflict) -> Self {
        match value {
            OnConflict::Overwrite => Self::Overwrite,
            OnConflict::Skip => Self::Skip,
            OnConflict::Error => Self::Error,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let token_cancel = CancelToken::new();
    if let Err(e) = register_stop_signals(&token_cancel) {
        tracing::error!("{e:#}");
        return ExitCode::FAILURE;
    }
    finish(run(cli, token_cancel))
}

/// Interrupted runs still succeed; only setup failures exit non-zero.
fn finish(res_report: Result<ReportCopy>) -> ExitCode {
    match res_report {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, token_cancel: CancelToken) -> Result<ReportCopy> {
    let selector = build_selector(&cli)?;
    let spec_cp_options = SpecCopyOptions {
        separator: cli.separator,
        rule_conflict_file: cli.on_conflict.into(),
        if_dry_run: cli.dry_run,
        token_cancel,
    };

    let report = copy_tree(&cli.src_dir, &cli.dest_dir, selector.as_ref(), spec_cp_options)
        .with_context(|| {
            format!(
                "copy from {} to {} failed",
                cli.src_dir.display(),
                cli.dest_dir.display()
            )
        })?;

    if report.if_interrupted {
        tracing::warn!("Operation interrupted, {} files copied", report.cnt_copied);
    } else {
        tracing::info!("Operation completed, {} files copied", report.cnt_copied);
    }
    Ok(report)
}

fn build_selector(cli: &Cli) -> Result<Box<dyn FileSelector>> {
    if cli.include.is_empty() && cli.exclude.is_empty() {
        return Ok(Box::new(SelectorExtensions::default()));
    }
    let selector = SelectorPatterns::from_raw(
        (!cli.include.is_empty()).then_some(cli.include.as_slice()),
        (!cli.exclude.is_empty()).then_some(cli.exclude.as_slice()),
        cli.pattern_mode.into(),
    )
    .context("invalid --include/--exclude pattern")?;
    Ok(Box::new(selector))
}

/// SIGINT/SIGTERM flip the token; the copier stops before the next file.
fn register_stop_signals(token_cancel: &CancelToken) -> Result<()> {
    for &n_signal in signal_hook::consts::TERM_SIGNALS {
        signal_hook::flag::register(n_signal, token_cancel.flag())
            .context("failed to register signal handlers")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::process::ExitCode;

    use clap::Parser;
    use flatcopy_fs::CancelToken;

    use super::{Cli, finish, run};

    fn write_text(path: &std::path::Path, text: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("mkdir");
        }
        std::fs::write(path, text).expect("write");
    }

    #[test]
    fn run_cancelled_token_reports_interrupted_and_exits_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/note.md"), "a");
        write_text(&src.join("b.rst"), "b");

        let cli = Cli::parse_from([
            OsStr::new("flatcopy"),
            src.as_os_str(),
            dst.as_os_str(),
        ]);
        let token_cancel = CancelToken::new();
        token_cancel.cancel();

        let report = run(cli, token_cancel).expect("interrupted run is not an error");
        assert!(report.if_interrupted);
        assert_eq!(report.cnt_copied, 0);
        assert!(report.to_string().ends_with("(interrupted)"));
        assert_eq!(finish(Ok(report)), ExitCode::SUCCESS);
    }

    #[test]
    fn run_missing_source_exits_non_zero() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cli = Cli::parse_from([
            OsStr::new("flatcopy"),
            tmp.path().join("nope").as_os_str(),
            tmp.path().join("dst").as_os_str(),
        ]);

        let res_report = run(cli, CancelToken::new());
        assert!(res_report.is_err());
        assert_eq!(finish(res_report), ExitCode::FAILURE);
    }
}
