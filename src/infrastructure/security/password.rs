use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LENGTH: usize = 16;
const HASH_LENGTH: usize = 32;

/// Salted PBKDF2-SHA256 password hashing.
///
/// Encoded hashes look like `pbkdf2-sha256$<iterations>$<salt hex>$<hash hex>`,
/// so a change to the configured iteration count does not invalidate
/// passwords that were stored earlier.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> String {
        let mut salt = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt);
        let derived = derive(password, &salt, self.iterations);
        format!(
            "{SCHEME}${}${}${}",
            self.iterations,
            hex::encode(salt),
            hex::encode(derived)
        )
    }

    /// Malformed stored hashes never verify.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let Some((iterations, salt, expected)) = decode(encoded) else {
            return false;
        };
        let derived = derive(password, &salt, iterations);
        derived.ct_eq(expected.as_slice()).unwrap_u8() == 1
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> [u8; HASH_LENGTH] {
    let mut out = [0u8; HASH_LENGTH];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut out);
    out
}

fn decode(encoded: &str) -> Option<(u32, Vec<u8>, Vec<u8>)> {
    let mut parts = encoded.split('$');
    if parts.next()? != SCHEME {
        return None;
    }
    let iterations = parts.next()?.parse::<u32>().ok().filter(|n| *n > 0)?;
    let salt = hex::decode(parts.next()?).ok()?;
    let hash = hex::decode(parts.next()?).ok()?;
    if parts.next().is_some() || hash.len() != HASH_LENGTH {
        return None;
    }
    Some((iterations, salt, hash))
}
