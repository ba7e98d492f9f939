use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use vaultdb_core::config::VaultConfig;
use vaultdb_engine::Vault;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args: Vec<String> = env::args().collect();
    let mut cfg = VaultConfig::load()?;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
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

    let snapshot = cfg.snapshot_path();
    let vault = Vault::open(cfg)?;
    let status = vault.status();
    println!("📊 vault-status\n===============");
    println!("Snapshot:  {}", snapshot.display());
    println!("State:     {:?}", status.state);
    println!("Documents: {}", status.documents);
    println!("Chunks:    {}", status.chunks);
    println!("Dim:       {}", status.dim);
    Ok(())
}
