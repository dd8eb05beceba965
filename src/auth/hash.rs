//! Digest strategies for request signing.

use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

/// Hash algorithm used by [`SignatureAuth`](crate::auth::SignatureAuth).
///
/// `Md5Hash` is the legacy unkeyed scheme (the secret is appended to the
/// signing string before hashing); the HMAC strategies key the digest with
/// the secret instead. New integrations should use the keyed strategies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HashStrategy {
    /// Plain MD5 over the signing string with the secret appended.
    Md5Hash,
    /// HMAC-MD5 keyed with the secret.
    HmacMd5,
    /// HMAC-SHA1 keyed with the secret.
    HmacSha1,
    /// HMAC-SHA256 keyed with the secret.
    #[default]
    HmacSha256,
    /// HMAC-SHA512 keyed with the secret.
    HmacSha512,
}

impl HashStrategy {
    /// Compute the lowercase hex digest of `input` under this strategy.
    pub fn calculate(self, input: &str, secret: &str) -> String {
        match self {
            HashStrategy::Md5Hash => {
                let mut hasher = Md5::new();
                hasher.update(input.as_bytes());
                hasher.update(secret.as_bytes());
                hex::encode(hasher.finalize())
            }
            HashStrategy::HmacMd5 => hmac_hex::<Hmac<Md5>>(input, secret),
            HashStrategy::HmacSha1 => hmac_hex::<Hmac<Sha1>>(input, secret),
            HashStrategy::HmacSha256 => hmac_hex::<Hmac<Sha256>>(input, secret),
            HashStrategy::HmacSha512 => hmac_hex::<Hmac<Sha512>>(input, secret),
        }
    }
}

fn hmac_hex<M: Mac + KeyInit>(input: &str, secret: &str) -> String {
    let mut mac =
        <M as KeyInit>::new_from_slice(secret.as_bytes()).expect("hmac accepts keys of any length");
    mac.update(input.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
