// Backup planning tool - shows which files of a database directory a backup
// would copy, and how much of each.
//
// Usage:
//   cargo run --bin backup_plan -- <db_dir> [--dest <dir>] [--config <file>]

use std::io;
use std::path::PathBuf;

use clap::Parser;

use oxibackup::backup::{BackupEnv, DirCopySink};
use oxibackup::config::OxibackupConfig;
use oxibackup::env::PosixEnv;

#[derive(Parser, Debug)]
#[command(name = "backup_plan")]
#[command(about = "Plan or run an online backup of a database directory", long_about = None)]
struct Args {
    /// Database directory
    #[arg(value_name = "DB_DIR")]
    db_dir: PathBuf,

    /// Copy the planned files into this directory
    #[arg(short, long)]
    dest: Option<PathBuf>,

    /// TOML configuration file (defaults to OXIBACKUP_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn load_config(args: &Args) -> io::Result<OxibackupConfig> {
    let config = match &args.config {
        Some(path) => OxibackupConfig::load_from_path(path).and_then(|mut c| {
            c.apply_env_overrides()?;
            Ok(c)
        }),
        None => OxibackupConfig::load_from_env(),
    };
    config.map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let posix = config
        .env_config()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?
        .posix_env()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "backup_plan needs a posix environment",
            )
        })?;
    let env = BackupEnv::new(posix.clone()).with_options(config.to_backup_options());

    let Some(dest) = &args.dest else {
        let plan = env.plan(&args.db_dir)?;
        println!("Plan for {} ({} files)\n", args.db_dir.display(), plan.len());
        for entry in &plan {
            println!("  {:<24} {:<11} {}", entry.name, entry.file_type, entry.bound);
        }
        return Ok(());
    };

    let mut sink =
        DirCopySink::new(posix.clone(), posix, dest).with_chunk_size(config.copy_chunk_size());
    let report = env.backup(&args.db_dir, &mut sink)?;

    println!("Backup {} -> {}", args.db_dir.display(), dest.display());
    println!("  token:     {}", report.token);
    println!("  files:     {}", report.files.len());
    println!("  bytes:     {}", sink.bytes_copied());
    println!("  elapsed:   {:?}", report.elapsed);
    for failure in &report.failed_deletions {
        println!(
            "  deferred deletion failed: {} ({})",
            failure.path.display(),
            failure.error
        );
    }

    Ok(())
}
