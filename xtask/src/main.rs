use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, exit};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Handler binaries shipped to the compute runtime.
const HANDLERS: [&str; 4] = ["get_item", "post_item", "healthcheck", "populate_database"];

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the croft workspace",
    long_about = "Packages the handler binaries into Lambda-compatible zip\n\
                  archives and runs CI chores."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and package handler zips into target/lambda/
    Package {
        /// Compilation target triple for the handler binaries
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for binaries
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
    /// Run CI checks (fmt, clippy, tests)
    Ci,
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

// ── packaging ──────────────────────────────────────────────────────

fn package_handlers(target: &str, profile: BuildProfile) {
    step("Build handler binaries");
    let mut args = vec!["build", "-p", "croft-lambda", "--target", target];
    if let Some(flag) = profile.as_cargo_flag() {
        args.push(flag);
    }
    run_cargo(&args);

    step("Package handler zips");
    let out_dir = PathBuf::from("target/lambda");
    fs::create_dir_all(&out_dir).expect("failed to create target/lambda");

    for handler in HANDLERS {
        let binary = PathBuf::from("target")
            .join(target)
            .join(profile.dir_name())
            .join(handler);
        let archive = out_dir.join(format!("{handler}.zip"));
        zip_bootstrap(&binary, &archive);
        eprintln!("packaged {}", archive.display());
    }
}

/// Zips one binary as `bootstrap`, the entry point custom runtimes load.
fn zip_bootstrap(binary: &Path, archive: &Path) {
    let bytes = fs::read(binary).unwrap_or_else(|e| {
        eprintln!("cannot read {}: {e}", binary.display());
        exit(1);
    });

    let file = fs::File::create(archive).expect("failed to create archive");
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    writer
        .start_file("bootstrap", options)
        .expect("failed to start zip entry");
    writer.write_all(&bytes).expect("failed to write zip entry");
    writer.finish().expect("failed to finish archive");
}

// ── CI ─────────────────────────────────────────────────────────────

fn run_ci() {
    step("Format check");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"]);

    step("Tests");
    run_cargo(&["test", "--workspace"]);
}

fn main() {
    let cli = Cli::parse();
    match cli.command {
        Commands::Package { target, profile } => package_handlers(&target, profile),
        Commands::Ci => run_ci(),
    }
}
