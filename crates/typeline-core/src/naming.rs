//! # Reference Naming
//!
//! Deterministic mapping from human labels and document titles to
//! element references that are always valid variable names.
//!
//! - `person:a` → `$person-a`
//! - `person:a::age:1` → `$person-a--age-1`
//! - `Crème Brûlée` → `$doc-creme-brulee`
//!
//! Every mapping is idempotent: feeding a reference name back in
//! returns the same name.

use crate::primitives::{DOCUMENT_REF_PREFIX, RELATION_REF_PREFIX};
use crate::types::Reference;
use unicode_normalization::UnicodeNormalization;

/// Namer for element references.
pub struct ReferenceNamer;

impl ReferenceNamer {
    /// Reference for an entity or property-node label.
    ///
    /// Every character outside `[A-Za-z0-9_-]` becomes `-`. No collapsing
    /// happens, so `a::b` and `a:b` stay distinct (`a--b` vs `a-b`).
    #[must_use]
    pub fn label(label: &str) -> Reference {
        Reference(sanitize(label))
    }

    /// Reference for a relation-node label.
    #[must_use]
    pub fn relation(label: &str) -> Reference {
        Reference(sanitize(&format!("{RELATION_REF_PREFIX}{label}")))
    }

    /// Reference for a source document, derived from its title.
    ///
    /// The title is NFKD-decomposed and folded to ASCII, lower-cased, and
    /// each run of non-alphanumerics collapses into a single `-`.
    /// Titles without any ASCII letter or digit fall back to a stable hash.
    #[must_use]
    pub fn document(title: &str) -> Reference {
        let slug = slugify(title);
        if slug.is_empty() {
            return Reference(format!("{DOCUMENT_REF_PREFIX}{:016x}", fnv1a(title)));
        }
        Reference(format!("{DOCUMENT_REF_PREFIX}{slug}"))
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.nfkd().filter(char::is_ascii) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// 64-bit FNV-1a. Stable across platforms and releases.
fn fnv1a(s: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    s.bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

// =============================================================================
// TESTS
// =============================================================================
