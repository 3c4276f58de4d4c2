//! Key and envelope files
//!
//! Key files are raw suite encodings with no framing. Every write goes to a
//! temporary sibling first and is renamed into place, so a failed write never
//! leaves a truncated file behind.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{CryptoError, CryptoResult};
use crate::hybrid::Envelope;
use crate::key_management::keypair::{KeyPair, KeyPairService};
use crate::secure_memory::SecureBytes;

const PUBLIC_FILE_MODE: u32 = 0o644;
const PRIVATE_FILE_MODE: u32 = 0o600;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary sibling of `path`, unique per process and per call
fn temp_path(path: &Path) -> PathBuf {
    let sequence = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".tmp-{}-{}", std::process::id(), sequence));
    path.with_file_name(name)
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> CryptoError {
    CryptoError::IoError(format!("Failed to {} {}: {}", action, path.display(), err))
}

#[cfg(unix)]
fn create_file(path: &Path, mode: u32) -> std::io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;

    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn create_file(path: &Path, _mode: u32) -> std::io::Result<fs::File> {
    fs::File::create(path)
}

/// Write `data` to `path` atomically with the given Unix permissions
fn write_atomic(path: &Path, data: &[u8], mode: u32) -> CryptoResult<()> {
    let tmp = temp_path(path);

    let written = create_file(&tmp, mode).and_then(|mut file| {
        file.write_all(data)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(io_error("write", &tmp, e));
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        io_error("rename into", path, e)
    })
}

/// Stores a key pair as two raw binary files
pub fn store_key_pair(
    key_pair: &KeyPair,
    public_path: impl AsRef<Path>,
    private_path: impl AsRef<Path>,
) -> CryptoResult<()> {
    let (public_path, private_path) = (public_path.as_ref(), private_path.as_ref());

    write_atomic(public_path, &key_pair.public_key, PUBLIC_FILE_MODE)?;
    write_atomic(private_path, key_pair.private_key.as_bytes(), PRIVATE_FILE_MODE)?;

    log::info!("Public key written to {}", public_path.display());
    log::info!("Private key written to {}", private_path.display());
    Ok(())
}

/// Reads a raw public key file
pub fn load_public_key(path: impl AsRef<Path>) -> CryptoResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| io_error("read public key", path, e))
}

/// Reads a raw private key file
pub fn load_private_key(path: impl AsRef<Path>) -> CryptoResult<SecureBytes> {
    let path = path.as_ref();
    fs::read(path)
        .map(SecureBytes::from)
        .map_err(|e| io_error("read private key", path, e))
}

/// Reads both key files and checks that they belong together
pub fn load_key_pair(
    public_path: impl AsRef<Path>,
    private_path: impl AsRef<Path>,
) -> CryptoResult<KeyPair> {
    let public_key = load_public_key(public_path)?;
    let private_key = load_private_key(private_path)?;
    KeyPairService.deserialize(&public_key, private_key.as_bytes())
}

/// Writes an envelope as pretty JSON
pub fn store_envelope(envelope: &Envelope, path: impl AsRef<Path>) -> CryptoResult<()> {
    let json = envelope.to_json()?;
    write_atomic(path.as_ref(), json.as_bytes(), PUBLIC_FILE_MODE)
}

/// Reads an envelope written by [`store_envelope`] or a compatible tool
pub fn load_envelope(path: impl AsRef<Path>) -> CryptoResult<Envelope> {
    let path = path.as_ref();
    let data = fs::read(path).map_err(|e| io_error("read envelope", path, e))?;
    Envelope::from_json_slice(&data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_key_pair_files_roundtrip() {
        let dir = tempdir().unwrap();
        let public_path = dir.path().join("public.bin");
        let private_path = dir.path().join("private.bin");

        let key_pair = KeyPairService.generate().unwrap();
        store_key_pair(&key_pair, &public_path, &private_path).unwrap();

        assert_eq!(fs::read(&public_path).unwrap(), key_pair.public_key);
        assert_eq!(load_key_pair(&public_path, &private_path).unwrap(), key_pair);
    }

    #[cfg(unix)]
    #[test]
    fn test_private_key_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let public_path = dir.path().join("public.bin");
        let private_path = dir.path().join("private.bin");

        let key_pair = KeyPairService.generate().unwrap();
        store_key_pair(&key_pair, &public_path, &private_path).unwrap();

        let mode = fs::metadata(&private_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[test]
    fn test_failed_write_leaves_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("missing-dir").join("out.json");

        let envelope = Envelope {
            psk_identity: "id".to_string(),
            cipher_text: vec![1],
            encapsulation_key: vec![4],
            context: Vec::new(),
            aad: Vec::new(),
        };

        assert!(matches!(
            store_envelope(&envelope, &target),
            Err(CryptoError::IoError(_))
        ));
        assert!(!target.exists());
    }

    #[test]
    fn test_temp_paths_are_unique_per_call() {
        let target = Path::new("/tmp/out.json");
        let first = temp_path(target);
        let second = temp_path(target);

        assert_ne!(first, second);
        assert_eq!(first.parent(), target.parent());
    }

    #[test]
    fn test_concurrent_stores_to_same_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.json");

        let envelopes: Vec<Envelope> = (0u8..8)
            .map(|i| Envelope {
                psk_identity: format!("id-{}", i),
                cipher_text: vec![i; 4096],
                encapsulation_key: vec![4; 65],
                context: b"ctx".to_vec(),
                aad: Vec::new(),
            })
            .collect();

        std::thread::scope(|scope| {
            for envelope in &envelopes {
                let target = &target;
                scope.spawn(move || {
                    for _ in 0..10 {
                        store_envelope(envelope, target).unwrap();
                    }
                });
            }
        });

        // The file is always one complete envelope, never a mix
        let stored = load_envelope(&target).unwrap();
        assert!(envelopes.contains(&stored));

        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load_public_key(dir.path().join("nope.bin"));
        assert!(matches!(result, Err(CryptoError::IoError(_))));
    }
}
