// ==========================================
// Rural Sales IMS - product catalog
// ==========================================
// The catalog is fixed and closed: seeded once into the store, never
// extended by ingestion. Free-text packing descriptions are matched
// against these canonical names.
// ==========================================

use serde::{Deserialize, Serialize};

/// One entry of the fixed catalog used for seeding.
#[derive(Debug, Clone, Copy)]
pub struct ProductSpec {
    pub name: &'static str,
    pub packing_type: &'static str,
    pub capacity_ltr: f64,
    pub category: &'static str,
    pub standard_rate: f64,
}

/// The full fixed catalog, in seeding order.
pub const PRODUCT_CATALOG: [ProductSpec; 8] = [
    ProductSpec { name: "1 LTR PLASTIC JAR", packing_type: "PLASTIC_JAR", capacity_ltr: 1.0, category: "Regular", standard_rate: 95.0 },
    ProductSpec { name: "2 LTR PLASTIC JAR", packing_type: "PLASTIC_JAR", capacity_ltr: 2.0, category: "Regular", standard_rate: 185.0 },
    ProductSpec { name: "5 LTR PLASTIC JAR", packing_type: "PLASTIC_JAR", capacity_ltr: 5.0, category: "Regular", standard_rate: 460.0 },
    ProductSpec { name: "5 LTR STEEL BARNI", packing_type: "STEEL_BARNI", capacity_ltr: 5.0, category: "Premium", standard_rate: 680.0 },
    ProductSpec { name: "10 LTR STEEL BARNI", packing_type: "STEEL_BARNI", capacity_ltr: 10.0, category: "Premium", standard_rate: 1300.0 },
    ProductSpec { name: "20 LTR STEEL BARNI", packing_type: "STEEL_BARNI", capacity_ltr: 20.0, category: "Premium", standard_rate: 2950.0 },
    ProductSpec { name: "20 LTR PLASTIC CAN", packing_type: "PLASTIC_CAN", capacity_ltr: 20.0, category: "Regular", standard_rate: 2400.0 },
    ProductSpec { name: "1 LTR PET BOTTLE", packing_type: "PET_BOTTLE", capacity_ltr: 1.0, category: "Regular", standard_rate: 85.0 },
];

/// First catalog entry whose canonical name occurs in the free-text
/// packing description, case-insensitively. None means the description
/// is outside the closed catalog.
pub fn spec_for_packing(packing_text: &str) -> Option<&'static ProductSpec> {
    let needle = packing_text.to_uppercase();
    PRODUCT_CATALOG.iter().find(|spec| needle.contains(spec.name))
}

/// Persisted product row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    pub packing_type: String,
    pub capacity_ltr: f64,
    pub category: String,
    pub standard_rate: f64,
}

impl From<(i64, &ProductSpec)> for Product {
    fn from((product_id, spec): (i64, &ProductSpec)) -> Self {
        Self {
            product_id,
            product_name: spec.name.to_string(),
            packing_type: spec.packing_type.to_string(),
            capacity_ltr: spec.capacity_ltr,
            category: spec.category.to_string(),
            standard_rate: spec.standard_rate,
        }
    }
}
