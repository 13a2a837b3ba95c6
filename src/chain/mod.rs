//! Tamper-evident hash chain over finalized invoices.
//!
//! Each finalized invoice stores `H(canonical(invoice) ‖ prev_hash)`,
//! linking it to its predecessor; sequence 1 links to a documented genesis
//! constant derived from the company and fiscal year. Any retroactive
//! edit, deletion, or reordering of a historical
//! record breaks every digest from that point on, and [`verify`] pinpoints
//! the first broken link. Verification is pure: it never repairs anything.

mod canonical;

pub use canonical::canonical_bytes;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{CompanyId, Invoice};

/// Domain-separation tag for genesis digests. Changing it would invalidate
/// every stored chain, so it is versioned.
pub const GENESIS_TAG: &str = "facture.chain.genesis.v1";

/// Genesis digest for one company's fiscal-year chain:
/// `sha256(GENESIS_TAG ‖ 0x00 ‖ company ‖ 0x00 ‖ fiscalYear)`, lowercase
/// hex. Sequence numbering restarts at 1 each fiscal year, so each year
/// forms its own chain and this is the documented `hash_0` every verifier
/// of that year starts from.
pub fn genesis_hash(company_id: &CompanyId, fiscal_year: i32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(GENESIS_TAG.as_bytes());
    hasher.update([0u8]);
    hasher.update(company_id.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(fiscal_year.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Chain digest of an invoice given its predecessor's digest.
pub fn digest(canonical: &[u8], prev_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical);
    hasher.update(b"\n");
    hasher.update(prev_hash.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of a chain verification walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    /// True when every link recomputes to its stored value.
    pub valid: bool,
    /// Sequence number of the first invoice whose recomputed digest,
    /// stored linkage, or position disagrees with the stored chain.
    /// Everything after it is untrusted.
    pub first_broken_sequence: Option<u64>,
    /// Number of invoices walked.
    pub checked: u64,
}

impl ChainVerification {
    fn intact(checked: u64) -> Self {
        Self {
            valid: true,
            first_broken_sequence: None,
            checked,
        }
    }

    fn broken_at(sequence: u64, checked: u64) -> Self {
        Self {
            valid: false,
            first_broken_sequence: Some(sequence),
            checked,
        }
    }
}

/// Walk one fiscal year's finalized invoices (ordered by sequence) from
/// genesis, recomputing every digest and checking linkage and sequence
/// continuity.
///
/// Read-only and side-effect-free; an empty chain is valid. Reports the
/// *first* broken sequence, since one tampered record invalidates every
/// later link.
pub fn verify(
    company_id: &CompanyId,
    fiscal_year: i32,
    invoices: &[Invoice],
) -> ChainVerification {
    let mut prev = genesis_hash(company_id, fiscal_year);

    for (i, invoice) in invoices.iter().enumerate() {
        let expected_seq = (i + 1) as u64;

        // A missing or out-of-order sequence is itself a broken link: a
        // gapless chain is part of what the digests commit to.
        if invoice.sequence != Some(expected_seq) {
            return ChainVerification::broken_at(expected_seq, i as u64);
        }

        if invoice.prev_hash.as_deref() != Some(prev.as_str()) {
            return ChainVerification::broken_at(expected_seq, i as u64);
        }

        let recomputed = digest(&canonical_bytes(invoice), &prev);
        if invoice.self_hash.as_deref() != Some(recomputed.as_str()) {
            return ChainVerification::broken_at(expected_seq, i as u64);
        }

        prev = recomputed;
    }

    ChainVerification::intact(invoices.len() as u64)
}
