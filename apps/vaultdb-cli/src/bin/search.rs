use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use vaultdb_core::config::VaultConfig;
use vaultdb_core::types::SourceKind;
use vaultdb_engine::{QueryFilter, Vault};

fn parse_source(s: &str) -> Option<SourceKind> {
    match s {
        "web" => Some(SourceKind::Web),
        "pdf" => Some(SourceKind::Pdf),
        "note" => Some(SourceKind::Note),
        "trend" => Some(SourceKind::Trend),
        "other" => Some(SourceKind::Other),
        _ => None,
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [--limit N] [--source KIND] [--data-dir PATH]", args[0]);
        eprintln!("Example: {} 'rainwater collection' --limit 5 --source note", args[0]);
        std::process::exit(1);
    }
    let query_text = &args[1];
    let mut limit = 10usize;
    let mut source: Option<SourceKind> = None;
    let mut cfg = VaultConfig::load()?;
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => {
                if let Some(l) = args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                    limit = l;
                    i += 1;
                } else {
                    eprintln!("Error: --limit requires a number");
                    std::process::exit(1);
                }
            }
            "--source" => {
                if let Some(kind) = args.get(i + 1).and_then(|v| parse_source(v)) {
                    source = Some(kind);
                    i += 1;
                } else {
                    eprintln!("Error: --source requires one of web|pdf|note|trend|other");
                    std::process::exit(1);
                }
            }
            "--data-dir" => {
                if let Some(p) = args.get(i + 1) {
                    cfg.data_dir = PathBuf::from(p);
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

    println!("🔍 vault-search\n===============");
    println!("Query: {}", query_text);

    let vault = Vault::open(cfg)?;
    let filter = source.map(|kind| QueryFilter::by_sources(vec![kind]));
    let results = vault.query(query_text, limit, filter.as_ref())?;

    println!("\n🔍 Found {} results for: \"{}\"", results.len(), query_text);
    for (i, result) in results.iter().enumerate() {
        println!(
            "\n  {}. score={:.4}  chunk={}  doc={}  title={}",
            i + 1,
            result.score,
            result.chunk_id,
            result.doc_id,
            result.title
        );
        println!("     📝 {}", result.text);
    }
    Ok(())
}
