//! Example: work with a kDrive folder through paths
//!
//! Usage:
//!   cargo run --example kdrive -- --root-url URL --token TOKEN stat /first/outside.png
//!   cargo run --example kdrive -- --root-url URL ls /first
//!   cargo run --example kdrive -- --root-url URL find / --first-non-empty
//!   cargo run --example kdrive -- --root-url URL get /first/outside.png -o outside.png
//!   cargo run --example kdrive -- --root-url URL put ./report.csv /reports/report.csv
//!   cargo run --example kdrive -- --root-url URL mv /reports/report.csv /archive/report.csv
//!   cargo run --example kdrive -- --root-url URL rm /archive
//!
//! Set `RUST_LOG=kdrivefs=debug` to see every remote call.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use kdrivefs::{DriveFs, MountConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Path-based access to a kDrive folder
#[derive(Parser, Debug)]
#[command(name = "kdrive", version, about)]
struct Args {
    /// Web URL of the folder to mount (…/drive/{drive_id}/files/{folder_id})
    #[arg(long, env = "KDRIVE_ROOT_URL")]
    root_url: String,

    /// Infomaniak API token
    #[arg(long, env = "KDRIVE_TOKEN", hide_env_values = true)]
    token: String,

    /// Sub-path of the mounted folder to treat as root
    #[arg(long, default_value = "")]
    root: String,

    /// Cache listings for this many seconds
    #[arg(long)]
    cache_ttl: Option<u64>,

    /// HTTP or SOCKS proxy
    #[arg(long)]
    proxy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show information about a path
    Stat { path: String },
    /// List a folder
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    /// List every file below a path
    Find {
        #[arg(default_value = "/")]
        path: String,
        /// Stop at the first non-empty file
        #[arg(long)]
        first_non_empty: bool,
    },
    /// Download a file
    Get {
        path: String,
        /// Write here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload a local file
    Put { local: PathBuf, path: String },
    /// Move or rename
    Mv { from: String, to: String },
    /// Delete a file or folder recursively
    Rm { path: String },
}

fn print_json<T: Serialize>(value: &T) -> kdrivefs::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(fs: &DriveFs<kdrivefs::DynStore>, command: Command) -> kdrivefs::Result<()> {
    match command {
        Command::Stat { path } => match fs.stat(&path).await? {
            Some(stat) => print_json(&stat)?,
            None => {
                eprintln!("Not found: {}", path);
                process::exit(1);
            }
        },
        Command::Ls { path } => print_json(&fs.browse(&path).await?)?,
        Command::Find {
            path,
            first_non_empty,
        } => match fs.enumerate(&path, first_non_empty).await? {
            Some(records) => print_json(&records)?,
            None => {
                eprintln!("Not found: {}", path);
                process::exit(1);
            }
        },
        Command::Get { path, output } => {
            let written = match output {
                Some(local) => fs.read(&path, &mut File::create(local)?, None).await?,
                None => fs.read(&path, &mut io::stdout().lock(), None).await?,
            };
            eprintln!("{} bytes", written);
        }
        Command::Put { local, path } => {
            fs.write(&path, &mut File::open(local)?).await?;
            eprintln!("Uploaded {}", path);
        }
        Command::Mv { from, to } => {
            if !fs.move_path(&from, &to).await? {
                eprintln!("Not found: {}", from);
                process::exit(1);
            }
        }
        Command::Rm { path } => {
            let deleted = fs.delete_recursive(&path).await?;
            eprintln!("Deleted {} item(s)", deleted);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = MountConfig::new(&args.root_url, &args.token).with_root(&args.root);
    config.listing_cache_ttl_secs = args.cache_ttl;
    config.proxy = args.proxy;

    let fs = match DriveFs::connect(&config) {
        Ok(fs) => fs,
        Err(e) => {
            eprintln!("Cannot mount {}: {}", args.root_url, e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&fs, args.command).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    let _ = fs.close();
}
