use std::env;
use std::path::PathBuf;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use vaultdb_core::config::{expand_path, VaultConfig};
use vaultdb_core::traits::DocumentProducer;
use vaultdb_engine::{NoteFileProducer, Vault};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <notes_dir> [--data-dir PATH]", args[0]);
        eprintln!("Example: {} ~/notes --data-dir ./data", args[0]);
        std::process::exit(1);
    }
    let notes_dir = expand_path(&args[1]);
    let mut cfg = VaultConfig::load()?;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" => {
                if i + 1 < args.len() {
                    cfg.data_dir = PathBuf::from(&args[i + 1]);
                    i += 1;
                } else {
                    eprintln!("Error: --data-dir requires a path");
                    std::process::exit(1);
                }
            }
            _ => {}
        }
        i += 1;
    }

    println!("📚 vault-ingest\n===============");
    println!("Notes: {}", notes_dir.display());
    println!("Data:  {}", cfg.data_dir.display());

    let vault = Vault::open(cfg)?;
    let producer = NoteFileProducer::new(&notes_dir);
    let docs = producer.produce()?;
    if docs.is_empty() {
        println!("No .txt/.md files found under {}.", notes_dir.display());
        return Ok(());
    }

    let pb = ProgressBar::new(docs.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut ok = 0usize;
    let mut failed = 0usize;
    for doc in docs {
        let id = doc.id.clone();
        match vault.ingest(doc) {
            Ok(_) => ok += 1,
            Err(e) => {
                failed += 1;
                pb.println(format!("⚠️  skipped '{}': {}", id, e));
            }
        }
        pb.inc(1);
        pb.set_message(id);
    }
    pb.finish_with_message("done");

    vault.save()?;
    let status = vault.status();
    println!("✅ Ingested {} documents ({} failed)", ok, failed);
    println!("📊 Vault now holds {} documents / {} chunks", status.documents, status.chunks);
    Ok(())
}
