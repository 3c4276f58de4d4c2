use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hpke_psk::cli::MacArgs;
use hpke_psk::error::CryptoResult;
use hpke_psk::hybrid::{Context, Sender, DEFAULT_INFO_PREFIX};
use hpke_psk::key_management::{load_public_key, store_envelope};

/// Encrypt a message to the recipient's public key under a hardware-derived PSK
#[derive(Parser, Debug)]
#[command(name = "hpke-psk-encrypt", version)]
struct Cli {
    /// Recipient public key file
    #[arg(long, default_value = "certs/public.bin")]
    public_key: PathBuf,

    /// Envelope output file
    #[arg(long, default_value = "certs/out.json")]
    out: PathBuf,

    /// PSK identity
    #[arg(long, default_value = "mypsk-id")]
    psk_id: String,

    /// Plaintext to encrypt
    #[arg(long, default_value = "text encrypted to Bob's public key")]
    data: String,

    /// Additional authenticated data
    #[arg(long, default_value = "additional public data")]
    aad: String,

    /// Context (HPKE info) prefix
    #[arg(long, default_value = DEFAULT_INFO_PREFIX)]
    info: String,

    /// Use --info verbatim instead of appending a fresh nonce
    #[arg(long)]
    no_nonce: bool,

    #[command(flatten)]
    mac: MacArgs,
}

fn run(cli: Cli) -> CryptoResult<()> {
    let public_key = load_public_key(&cli.public_key)?;

    let context = if cli.no_nonce {
        Context::fixed(cli.info.as_bytes())
    } else {
        Context::with_nonce(cli.info.as_bytes())
    };

    let binder = cli.mac.into_binder()?;
    let envelope = Sender::new(&binder).encrypt(
        &public_key,
        cli.data.as_bytes(),
        &cli.psk_id,
        cli.aad.as_bytes(),
        &context,
    )?;

    store_envelope(&envelope, &cli.out)?;
    log::info!("Envelope written to {}", cli.out.display());
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
