//! Canary CLI
//!
//! Operator tooling: key generation, signing new canaries, and offline
//! verification of a canary store.

#![warn(missing_docs)]
#![warn(clippy::all)]

use canary_core::{Duration, RawDocument, SignedStatement, Timestamp};
use canary_proof::{CanaryKey, PublicKey, open_proof, seal_proof};
use canary_storage::{ChainArchive, DirectoryStore, StoreConfig, recover};
use clap::{Parser, Subcommand};
use color_eyre::Result;
use color_eyre::eyre::{WrapErr, bail, eyre};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "canary")]
#[command(about = "Warrant canary operator tooling", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a signing key
    Keygen {
        /// Secret key output file; the public key goes to <out>.pub
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Sign a new canary
    Sign {
        /// Secret key file
        #[arg(short, long)]
        key: PathBuf,
        /// Deadline as RFC 3339 or relative to now (`+30d`, `+12h`)
        #[arg(short, long)]
        deadline: String,
        /// The current latest proof, exactly as published
        #[arg(short, long)]
        previous: Option<PathBuf>,
        /// Statement text
        #[arg(short, long, default_value = "")]
        message: String,
        /// Write the proof here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Print the linkage hash of a document
    Hash {
        /// Document file
        file: PathBuf,
    },
    /// Check that a store holds a valid chain
    VerifyStore {
        /// Store directory
        #[arg(short, long)]
        dir: PathBuf,
        /// Public key file
        #[arg(short = 'k', long)]
        public_key: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("canary=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Keygen { out } => {
            let public = keygen(&out)?;
            println!("{}", public);
            Ok(())
        }
        Commands::Sign {
            key,
            deadline,
            previous,
            message,
            out,
        } => {
            let key = CanaryKey::from_hex(&read_text(&key)?)?;
            let deadline = parse_deadline(&deadline, Timestamp::now())?;
            let previous = previous.map(|p| read_text(&p)).transpose()?.map(RawDocument::from);
            let proof = sign(&key, deadline, previous.as_ref(), message)?;
            match out {
                Some(path) => fs::write(&path, proof.as_str())
                    .wrap_err_with(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", proof.as_str()),
            }
            Ok(())
        }
        Commands::Hash { file } => {
            println!("{}", RawDocument::new(read_text(&file)?).hash());
            Ok(())
        }
        Commands::VerifyStore { dir, public_key } => {
            let key = PublicKey::from_hex(&read_text(&public_key)?)?;
            println!("{}", verify_store(&dir, &key)?);
            Ok(())
        }
    }
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

fn keygen(out: &Path) -> Result<PublicKey> {
    let key = CanaryKey::generate();
    let public = key.public_key();
    let pub_path = PathBuf::from(format!("{}.pub", out.display()));

    write_new(out, &key.to_hex())?;
    write_new(&pub_path, &public.to_hex())?;
    Ok(public)
}

fn write_new(path: &Path, hex: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .wrap_err_with(|| format!("refusing to overwrite {}", path.display()))?;
    writeln!(file, "{}", hex)?;
    Ok(())
}

fn parse_deadline(text: &str, now: Timestamp) -> Result<Timestamp> {
    let Some(relative) = text.strip_prefix('+') else {
        return Ok(Timestamp::parse_rfc3339(text)?);
    };
    let unit_start = relative.char_indices().last().map_or(0, |(i, _)| i);
    let (amount, unit) = relative.split_at(unit_start);
    let amount: u64 = amount
        .parse()
        .map_err(|_| eyre!("invalid relative deadline: {}", text))?;
    let offset = match unit {
        "d" => Duration::from_days(amount),
        "h" => Duration::from_secs(amount.saturating_mul(3_600)),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        _ => bail!("unknown deadline unit in {} (use d, h or m)", text),
    };
    Ok(now.add(&offset))
}

fn sign(
    key: &CanaryKey,
    deadline: Timestamp,
    previous: Option<&RawDocument>,
    message: String,
) -> Result<RawDocument> {
    if let Some(previous) = previous {
        // Catch signing against a proof from another key before publishing.
        let prior = open_proof(&key.public_key(), previous)
            .wrap_err("previous proof does not verify under this key")?;
        if deadline <= prior.deadline {
            bail!(
                "deadline {} must be after previous deadline {}",
                deadline,
                prior.deadline
            );
        }
    }
    let statement =
        SignedStatement::new(deadline, previous.map(RawDocument::hash)).with_message(message);
    Ok(seal_proof(key, &statement)?)
}

fn verify_store(dir: &Path, key: &PublicKey) -> Result<String> {
    if !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    let store = DirectoryStore::open(StoreConfig {
        dir: dir.to_path_buf(),
        fsync: false,
    })?;
    let count = store.load_all()?.len();
    Ok(match recover(&store, key)? {
        Some(tip) => format!(
            "chain OK: {} canaries, latest deadline {}, hash {}",
            count,
            tip.deadline(),
            tip.hash()
        ),
        None => "store is empty".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canary_chain::PersistenceGateway;

    #[test]
    fn test_parse_relative_deadline() {
        let now = Timestamp::new(1_000, 0);
        assert_eq!(parse_deadline("+2d", now).unwrap(), Timestamp::new(1_000 + 172_800, 0));
        assert_eq!(parse_deadline("+3h", now).unwrap(), Timestamp::new(1_000 + 10_800, 0));
        assert!(parse_deadline("+3w", now).is_err());
        assert!(parse_deadline("+d", now).is_err());
        assert!(parse_deadline("+3é", now).is_err());
    }

    #[test]
    fn test_parse_absolute_deadline() {
        let t = parse_deadline("2030-01-01T00:00:00Z", Timestamp::new(0, 0)).unwrap();
        assert_eq!(t, Timestamp::parse_rfc3339("2030-01-01T00:00:00Z").unwrap());
    }

    #[test]
    fn test_keygen_writes_both_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("canary.key");
        let public = keygen(&out).unwrap();

        let key = CanaryKey::from_hex(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(key.public_key(), public);
        let pub_text = fs::read_to_string(dir.path().join("canary.key.pub")).unwrap();
        assert_eq!(PublicKey::from_hex(&pub_text).unwrap(), public);

        assert!(keygen(&out).is_err());
    }

    #[test]
    fn test_sign_links_to_previous() {
        let key = CanaryKey::generate();
        let first = sign(&key, Timestamp::new(100, 0), None, "one".into()).unwrap();
        let second = sign(&key, Timestamp::new(200, 0), Some(&first), "two".into()).unwrap();

        let stmt = open_proof(&key.public_key(), &second).unwrap();
        assert_eq!(stmt.previous, Some(first.hash()));
        assert_eq!(stmt.message, "two");

        assert!(sign(&key, Timestamp::new(50, 0), Some(&first), String::new()).is_err());
        let stranger = CanaryKey::generate();
        assert!(sign(&stranger, Timestamp::new(300, 0), Some(&first), String::new()).is_err());
    }

    #[test]
    fn test_verify_store() {
        let dir = tempfile::tempdir().unwrap();
        let key = CanaryKey::generate();
        let store = DirectoryStore::open(StoreConfig {
            dir: dir.path().to_path_buf(),
            fsync: false,
        })
        .unwrap();
        assert_eq!(verify_store(dir.path(), &key.public_key()).unwrap(), "store is empty");

        let first = sign(&key, Timestamp::new(100, 0), None, String::new()).unwrap();
        store.store(&first, Timestamp::new(100, 0)).unwrap();
        let second = sign(&key, Timestamp::new(200, 0), Some(&first), String::new()).unwrap();
        store.store(&second, Timestamp::new(200, 0)).unwrap();

        let report = verify_store(dir.path(), &key.public_key()).unwrap();
        assert!(report.starts_with("chain OK: 2 canaries"));
        assert!(report.contains(&second.hash().to_hex()));

        assert!(verify_store(&dir.path().join("missing"), &key.public_key()).is_err());
    }
}
