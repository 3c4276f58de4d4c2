use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use hpke_psk::error::CryptoResult;
use hpke_psk::key_management::{store_key_pair, KeyPairService};

/// Generate the recipient's KEM key pair
#[derive(Parser, Debug)]
#[command(name = "hpke-psk-generate", version)]
struct Cli {
    /// Public key output file
    #[arg(long, default_value = "certs/public.bin")]
    public_key: PathBuf,

    /// Private key output file
    #[arg(long, default_value = "certs/private.bin")]
    private_key: PathBuf,
}

fn ensure_parent(path: &Path) -> CryptoResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

fn run(cli: Cli) -> CryptoResult<()> {
    ensure_parent(&cli.public_key)?;
    ensure_parent(&cli.private_key)?;

    let key_pair = KeyPairService.generate()?;
    store_key_pair(&key_pair, &cli.public_key, &cli.private_key)?;

    log::info!("Key fingerprint {}", key_pair.fingerprint());
    Ok(())
}

fn main() -> ExitCode {
    hpke_psk::cli::init_logging();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}
