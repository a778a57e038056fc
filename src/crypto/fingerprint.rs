//! Content fingerprint computation.
//!
//! Pure and deterministic: identical bytes and algorithm always produce an
//! identical lowercase hex digest. The streaming `Fingerprinter` lets large
//! content (video, document archives) hash in bounded memory.

use md5::Md5;
use sha2::{Digest, Sha256, Sha512};

use crate::domain::HashAlgorithm;

/// Incremental fingerprint computation.
pub struct Fingerprinter {
    inner: Inner,
}

enum Inner {
    Sha256(Sha256),
    Sha512(Sha512),
    Md5(Md5),
}

impl Fingerprinter {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let inner = match algorithm {
            HashAlgorithm::Sha256 => Inner::Sha256(Sha256::new()),
            HashAlgorithm::Sha512 => Inner::Sha512(Sha512::new()),
            HashAlgorithm::Md5 => Inner::Md5(Md5::new()),
        };
        Self { inner }
    }

    /// Feed a chunk of content.
    pub fn update(&mut self, chunk: &[u8]) {
        match &mut self.inner {
            Inner::Sha256(h) => h.update(chunk),
            Inner::Sha512(h) => h.update(chunk),
            Inner::Md5(h) => h.update(chunk),
        }
    }

    /// Finish and return the lowercase hex digest.
    pub fn finalize(self) -> String {
        match self.inner {
            Inner::Sha256(h) => hex::encode(h.finalize()),
            Inner::Sha512(h) => hex::encode(h.finalize()),
            Inner::Md5(h) => hex::encode(h.finalize()),
        }
    }
}

/// One-shot fingerprint of `content`.
pub fn fingerprint(content: &[u8], algorithm: HashAlgorithm) -> String {
    let mut hasher = Fingerprinter::new(algorithm);
    hasher.update(content);
    hasher.finalize()
}

/// Full-digest equality, case-insensitive over the hex encoding.
pub fn digests_equal(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.eq_ignore_ascii_case(b)
}
