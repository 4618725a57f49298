// ==========================================
// Rural Sales IMS - distributor entity
// ==========================================

use crate::domain::sheet::Provenance;
use serde::{Deserialize, Serialize};

/// Distributor record extracted from a sheet.
///
/// Identity is the name+village+taluka heuristic and is not enforced
/// unique in the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DistributorCandidate {
    pub name: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub mantri_name: String,
    pub mantri_mobile: String,
    pub sabhasad_count: i64,
    pub contact_in_group: i64,
    pub total_liters: f64,
    pub provenance: Provenance,
}

/// Persisted distributor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distributor {
    pub distributor_id: i64,
    pub name: String,
    pub village: String,
    pub taluka: String,
    pub district: String,
    pub mantri_name: String,
    pub mantri_mobile: String,
    pub sabhasad_count: i64,
    pub contact_in_group: i64,
    pub total_liters: f64,
    pub provenance: Provenance,
}

impl Distributor {
    pub fn from_candidate(distributor_id: i64, c: DistributorCandidate) -> Self {
        Self {
            distributor_id,
            name: c.name,
            village: c.village,
            taluka: c.taluka,
            district: c.district,
            mantri_name: c.mantri_name,
            mantri_mobile: c.mantri_mobile,
            sabhasad_count: c.sabhasad_count,
            contact_in_group: c.contact_in_group,
            total_liters: c.total_liters,
            provenance: c.provenance,
        }
    }
}
