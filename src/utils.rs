use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::error::ApiError;

pub const DEFAULT_STATE_LENGTH: usize = 16;
pub const DEFAULT_VERIFIER_LENGTH: usize = 128;

/// Digest used to derive a PKCE code challenge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn digest(&self, input: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(input).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(input).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(input).to_vec(),
        }
    }
}

/// Hex string of exactly `length` characters from the OS entropy source.
pub fn random_hex(length: usize) -> Result<String, ApiError> {
    let mut bytes = vec![0u8; length.div_ceil(2)];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| ApiError::RandomSource(e.to_string()))?;

    let mut encoded = hex::encode(bytes);
    encoded.truncate(length);
    Ok(encoded)
}

pub fn generate_state(length: usize) -> Result<String, ApiError> {
    if length == 0 {
        return Err(ApiError::InvalidArgument(
            "state length must be greater than zero".to_string(),
        ));
    }
    random_hex(length)
}

pub fn generate_code_verifier(length: usize) -> Result<String, ApiError> {
    if !(43..=128).contains(&length) {
        return Err(ApiError::InvalidArgument(format!(
            "code verifier length must be between 43 and 128, got {length}"
        )));
    }
    random_hex(length)
}

pub fn generate_code_challenge(verifier: &str, algorithm: HashAlgorithm) -> String {
    URL_SAFE_NO_PAD.encode(algorithm.digest(verifier.as_bytes()))
}

/// `Authorization` header value for HTTP Basic auth.
pub fn basic_auth(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

pub fn form_encode<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
        .finish()
}

pub fn split_scope(scope: &str) -> Vec<String> {
    scope.split_whitespace().map(str::to_string).collect()
}

/// Percent-encodes one URL path segment, leaving RFC 3986 unreserved
/// characters as they are.
pub fn encode_path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
