use sha2::{Digest, Sha256};
use usermirror_core::{Identity, IdentityEmbedder};

/// Vector length used for the users collection.
pub const DEFAULT_DIMENSION: usize = 128;

/// Embeds an identity as its SHA-256 digest scaled into `[0, 1]`.
///
/// Each digest byte (two hex characters of the hex digest) becomes one
/// component, `byte / 255.0`. The digest supplies 32 components; the rest of
/// the vector is zero-padded, and dimensions below 32 truncate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestEmbeddings {
    dimension: usize,
}

impl DigestEmbeddings {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Embed a raw identity string.
    pub fn embed_str(&self, identity: &str) -> Vec<f32> {
        let digest = Sha256::digest(identity.as_bytes());
        let mut vector: Vec<f32> = digest
            .iter()
            .take(self.dimension)
            .map(|byte| f32::from(*byte) / 255.0)
            .collect();
        vector.resize(self.dimension, 0.0);
        vector
    }
}

impl Default for DigestEmbeddings {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl IdentityEmbedder for DigestEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, identity: &Identity<'_>) -> Vec<f32> {
        self.embed_str(&identity.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_follow_hex_pairs_of_digest() {
        let identity = "u1_a@x.com_Alice";
        let hex: String = Sha256::digest(identity.as_bytes())
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();

        let vector = DigestEmbeddings::default().embed_str(identity);
        for (i, value) in vector.iter().take(32).enumerate() {
            let pair = &hex[i * 2..i * 2 + 2];
            let expected = u8::from_str_radix(pair, 16).unwrap() as f32 / 255.0;
            assert_eq!(*value, expected, "component {i}");
        }
    }

    #[test]
    fn short_dimension_truncates_digest() {
        let vector = DigestEmbeddings::new(4).embed_str("abc");
        let full = DigestEmbeddings::default().embed_str("abc");
        assert_eq!(vector.as_slice(), &full[..4]);
    }

    #[test]
    fn zero_dimension_is_empty() {
        assert!(DigestEmbeddings::new(0).embed_str("abc").is_empty());
    }
}
