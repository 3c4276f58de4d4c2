use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use hpke_psk::cli::MacArgs;
use hpke_psk::error::CryptoResult;
use hpke_psk::hybrid::Receiver;
use hpke_psk::key_management::{load_envelope, load_private_key};

/// Decrypt an envelope with the recipient's private key; the plaintext goes to stdout
#[derive(Parser, Debug)]
#[command(name = "hpke-psk-decrypt", version)]
struct Cli {
    /// Recipient private key file
    #[arg(long, default_value = "certs/private.bin")]
    private_key: PathBuf,

    /// Envelope input file
    #[arg(long = "in", default_value = "certs/out.json")]
    input: PathBuf,

    #[command(flatten)]
    mac: MacArgs,
}

fn run(cli: Cli) -> CryptoResult<()> {
    let private_key = load_private_key(&cli.private_key)?;
    let envelope = load_envelope(&cli.input)?;

    let binder = cli.mac.into_binder()?;
    let plaintext = Receiver::new(&binder).decrypt(private_key.as_bytes(), &envelope)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&plaintext)?;
    if stdout.is_terminal() {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    hpke_psk::cli::init_logging();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_decryption_failure() {
                log::debug!("{:?}", e.technical_details());
            }
            eprintln!("Error: {}", e.user_friendly_message());
            ExitCode::FAILURE
        }
    }
}
