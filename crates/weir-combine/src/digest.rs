//! Integrity digests for chunked events.
//!
//! Every chunk carries four digest headers: a checksum and a hash over the
//! chunk's own integrity bytes, plus the checksum and hash declared for the
//! full recombined value. Each header value is `<algorithm>:<hex>`; the
//! algorithm identifier must match the digest the combining source was
//! configured with.

/// Computes hex-encoded digests over integrity bytes.
pub trait ChunkDigest: Send + Sync {
    /// Identifier carried as the `<algorithm>:` prefix on wire headers.
    fn algorithm(&self) -> &str;

    /// Hex-encoded digest of `bytes`.
    fn digest(&self, bytes: &[u8]) -> String;
}

/// CRC32 checksum, identifier `"crc32"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crc32;

impl ChunkDigest for Crc32 {
    fn algorithm(&self) -> &str {
        "crc32"
    }

    fn digest(&self, bytes: &[u8]) -> String {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(bytes);
        format!("{:08x}", hasher.finalize())
    }
}

/// SHA-256 hash, identifier `"sha256"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256;

impl ChunkDigest for Sha256 {
    fn algorithm(&self) -> &str {
        "sha256"
    }

    fn digest(&self, bytes: &[u8]) -> String {
        use sha2::Digest;
        let mut hasher = sha2::Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }
}

/// Resolve a configured algorithm identifier to a digest implementation.
pub fn digest_for(algorithm: &str) -> Option<Box<dyn ChunkDigest>> {
    match algorithm {
        "crc32" => Some(Box::new(Crc32)),
        "sha256" => Some(Box::new(Sha256)),
        _ => None,
    }
}

/// A parsed `<algorithm>:<value>` claim from a digest header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestClaim {
    pub algorithm: String,
    pub value: String,
}

impl DigestClaim {
    /// Parse a raw header value. Both parts must be non-empty.
    pub fn parse(raw: &str) -> Option<Self> {
        let (algorithm, value) = raw.split_once(':')?;
        if algorithm.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            algorithm: algorithm.to_string(),
            value: value.to_string(),
        })
    }

    /// Hex digests compare case-insensitively.
    pub fn matches(&self, computed: &str) -> bool {
        self.value.eq_ignore_ascii_case(computed)
    }
}

/// The chunk-scoped and original-scoped claims for one digest kind.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    pub chunk: DigestClaim,
    pub original: DigestClaim,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_vector() {
        // CRC32 of "123456789" is the classic check value 0xcbf43926.
        assert_eq!(Crc32.digest(b"123456789"), "cbf43926");
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            Sha256.digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_crc32_digest_is_zero_padded() {
        // CRC32 of the empty input is 0.
        assert_eq!(Crc32.digest(b""), "00000000");
    }

    #[test]
    fn test_claim_parsing() {
        let claim = DigestClaim::parse("crc32:cbf43926").unwrap();
        assert_eq!(claim.algorithm, "crc32");
        assert_eq!(claim.value, "cbf43926");

        assert!(DigestClaim::parse("no-separator").is_none());
        assert!(DigestClaim::parse(":missing-algo").is_none());
        assert!(DigestClaim::parse("crc32:").is_none());
    }

    #[test]
    fn test_claim_matches_ignores_hex_case() {
        let claim = DigestClaim::parse("crc32:CBF43926").unwrap();
        assert!(claim.matches("cbf43926"));
        assert!(!claim.matches("deadbeef"));
    }

    #[test]
    fn test_digest_for_unknown_algorithm() {
        assert!(digest_for("crc32").is_some());
        assert!(digest_for("sha256").is_some());
        assert!(digest_for("md5").is_none());
    }
}
