use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use go_introspect::{BuildConfig, FileBuilder, GoEnv, PackageBuilder};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Print the struct and interface declarations of Go files and packages as
/// JSON.
#[derive(Debug, Parser)]
#[command(name = "go-introspect", version)]
struct Cli {
    /// Go source file to introspect (repeatable)
    #[arg(long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Import paths of packages to introspect
    #[arg(value_name = "IMPORT_PATH")]
    packages: Vec<String>,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,

    /// Override GOROOT
    #[arg(long, value_name = "DIR")]
    goroot: Option<PathBuf>,

    /// Override GOPATH (path list)
    #[arg(long, value_name = "PATHS")]
    gopath: Option<std::ffi::OsString>,

    /// Override the target operating system
    #[arg(long)]
    goos: Option<String>,

    /// Override the target architecture
    #[arg(long)]
    goarch: Option<String>,
}

impl Cli {
    fn build_config(&self) -> BuildConfig {
        let mut config = BuildConfig::from_env();
        if let Some(goroot) = &self.goroot {
            config.goroot = Some(goroot.clone());
        }
        if let Some(gopath) = &self.gopath {
            config.gopath = std::env::split_paths(gopath).collect();
        }
        if let Some(goos) = &self.goos {
            config.goos = goos.clone();
        }
        if let Some(goarch) = &self.goarch {
            config.goarch = goarch.clone();
        }
        config
    }
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("GO_INTROSPECT_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if cli.files.is_empty() && cli.packages.is_empty() {
        anyhow::bail!("nothing to do: pass --file <PATH> or an import path");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for path in &cli.files {
        let file = FileBuilder::new(path)?.build()?;
        emit(&mut out, &file, cli.compact)
            .with_context(|| format!("writing model of {}", path.display()))?;
    }

    if !cli.packages.is_empty() {
        let env = GoEnv::new(cli.build_config());
        for import_path in &cli.packages {
            let package = PackageBuilder::with_resolver(import_path, &env)?.build()?;
            emit(&mut out, &package, cli.compact)
                .with_context(|| format!("writing model of package {import_path}"))?;
        }
    }

    Ok(())
}

fn emit(out: &mut impl Write, value: &impl Serialize, compact: bool) -> anyhow::Result<()> {
    if compact {
        serde_json::to_writer(&mut *out, value)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, value)?;
    }
    writeln!(out)?;
    Ok(())
}
