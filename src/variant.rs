//! Variant record representation
//!
//! A [`VariantKey`] is the immutable identity of a variant: chromosome,
//! 1-based position, reference allele, alternate allele. Equality is exact on
//! these four fields; equivalent representations (e.g. left-shifted indels)
//! are not normalized here. The key doubles as the fingerprint for caching
//! and merging.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Immutable identity of a variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariantKey {
    /// Chromosome name (e.g., "chr1", "1", "X", "chrM")
    pub chrom: String,
    /// 1-based position of the first base in the reference allele
    pub pos: u64,
    /// Reference allele
    pub reference: String,
    /// Alternate allele
    pub alternate: String,
}

impl VariantKey {
    /// Create a new variant key
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        reference: impl Into<String>,
        alternate: impl Into<String>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            reference: reference.into(),
            alternate: alternate.into(),
        }
    }

    /// Check that all key fields are usable: non-empty chromosome and
    /// alleles. Position 0 is accepted (telomeric convention).
    pub fn is_well_formed(&self) -> bool {
        !self.chrom.is_empty() && !self.reference.is_empty() && !self.alternate.is_empty()
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}>{}",
            self.chrom, self.pos, self.reference, self.alternate
        )
    }
}

/// A variant plus optional per-sample genotype data
///
/// The genotype columns are opaque to the engine and passed through to the
/// annotated record unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Variant identity
    pub key: VariantKey,

    /// Variant identifier from the input (e.g. rsID), None if "."
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// FORMAT field specification (e.g. "GT:DP:GQ"), passed through
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Raw per-sample genotype columns, passed through
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub samples: Vec<String>,
}

impl VariantRecord {
    /// Create a record with no genotype data
    pub fn new(key: VariantKey) -> Self {
        Self {
            key,
            id: None,
            format: None,
            samples: Vec::new(),
        }
    }

    /// Create a record for a SNV (single nucleotide variant)
    pub fn snv(chrom: &str, pos: u64, reference: char, alternate: char) -> Self {
        Self::new(VariantKey::new(
            chrom,
            pos,
            reference.to_string(),
            alternate.to_string(),
        ))
    }
}
