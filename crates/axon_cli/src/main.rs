//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a SQLite-backed store and print one owner's folder tree.
//! - Optionally purge expired items (sessions) before reading.
//! - Optionally write core log events to rotating files under `--log-dir`.
//!
//! Usage: `axon_cli <db_path> <email> [--purge-expired] [--log-dir <dir>]`

use axon_core::{
    CoreConfig, FolderRepository, KvStore, OwnerContext, SqliteKvStore, UserRepository,
};
use std::process::ExitCode;

const USAGE: &str = "usage: axon_cli <db_path> <email> [--purge-expired] [--log-dir <dir>]";

#[derive(Debug, PartialEq, Eq)]
struct Args {
    db_path: String,
    email: String,
    purge: bool,
    log_dir: Option<String>,
}

/// Parses positional arguments followed by flags in any order.
fn parse_args(args: &[String]) -> Option<Args> {
    let (db_path, email, mut rest) = match args {
        [db_path, email, rest @ ..] => (db_path, email, rest),
        _ => return None,
    };

    let mut parsed = Args {
        db_path: db_path.clone(),
        email: email.clone(),
        purge: false,
        log_dir: None,
    };
    while let Some((flag, tail)) = rest.split_first() {
        rest = match (flag.as_str(), tail) {
            ("--purge-expired", tail) if !parsed.purge => {
                parsed.purge = true;
                tail
            }
            ("--log-dir", [dir, tail @ ..]) if parsed.log_dir.is_none() => {
                parsed.log_dir = Some(dir.clone());
                tail
            }
            _ => return None,
        };
    }
    Some(parsed)
}

fn main() -> ExitCode {
    println!("axon_core version={}", axon_core::core_version());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(args) = parse_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = &args.log_dir {
        axon_core::init_logging(axon_core::default_log_level(), dir)?;
    }

    let store = SqliteKvStore::open(&args.db_path)?;
    let config = CoreConfig::default();

    if args.purge {
        let removed = store.purge_expired()?;
        println!("purged expired items: {removed}");
    }

    let user = UserRepository::new(&store, &config).find(&args.email)?;
    let folders = FolderRepository::new(&store, &config, OwnerContext::from(&user))
        .list_with_notes()?;

    println!("{} ({})", user.email, user.user_id);
    for entry in folders {
        println!(
            "  {} [{}] notes={}",
            entry.folder.folder_name,
            entry.folder.folder_id,
            entry.notes.len()
        );
        for note in entry.notes {
            println!("    {} [{}]", note.note_name, note.note_id);
        }
    }
    Ok(())
}
