// ==========================================
// Rural Sales IMS - customer entity
// ==========================================

use crate::domain::sheet::Provenance;
use serde::{Deserialize, Serialize};

/// Persisted customer.
///
/// `(name, mobile)` is the natural key used for deduplication; the
/// surrogate `customer_id` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub customer_code: String,
    pub name: String,
    pub mobile: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub provenance: Provenance,
}

/// Customer record extracted from a sheet, before identity resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCandidate {
    pub customer_code: String,
    pub name: String,
    pub mobile: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub provenance: Provenance,
}

impl CustomerCandidate {
    /// A candidate with neither name nor code carries no identity signal.
    pub fn has_identity(&self) -> bool {
        !self.name.is_empty() || !self.customer_code.is_empty()
    }
}
