// ==========================================
// Rural Sales IMS - identity resolution
// ==========================================
// Customers resolve through the store's atomic upsert on (name, mobile).
// Products resolve against an immutable in-memory catalog built once at
// startup; the catalog is closed, unmatched descriptions stay unlinked.
// ==========================================

use crate::domain::product::Product;

/// One resolved catalog match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogHit {
    pub product_id: i64,
    pub standard_rate: f64,
    pub capacity_ltr: f64,
}

/// Immutable keyed view of the persisted product catalog.
///
/// Lookups are pure functions over the snapshot taken at construction;
/// ingestion never mutates the catalog.
#[derive(Debug, Clone)]
pub struct ProductCatalog {
    entries: Vec<(String, CatalogHit)>,
}

impl ProductCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        let entries = products
            .into_iter()
            .map(|p| {
                (
                    p.product_name.to_uppercase(),
                    CatalogHit {
                        product_id: p.product_id,
                        standard_rate: p.standard_rate,
                        capacity_ltr: p.capacity_ltr,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// First catalog entry whose canonical name occurs in the free-text
    /// description, case-insensitively. None means unlinked, never a
    /// fabricated entry.
    pub fn resolve(&self, description: &str) -> Option<CatalogHit> {
        let needle = description.to_uppercase();
        self.entries
            .iter()
            .find(|(name, _)| needle.contains(name.as_str()))
            .map(|(_, hit)| *hit)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::PRODUCT_CATALOG;

    fn catalog() -> ProductCatalog {
        let products = PRODUCT_CATALOG
            .iter()
            .enumerate()
            .map(|(i, spec)| Product::from((i as i64 + 1, spec)))
            .collect();
        ProductCatalog::new(products)
    }

    #[test]
    fn test_resolves_exact_and_embedded_descriptions() {
        let c = catalog();

        let hit = c.resolve("5 LTR STEEL BARNI").unwrap();
        assert_eq!(hit.product_id, 4);
        assert_eq!(hit.standard_rate, 680.0);
        assert_eq!(hit.capacity_ltr, 5.0);

        let embedded = c.resolve("2 x 1 ltr plastic jar (promo)").unwrap();
        assert_eq!(embedded.standard_rate, 95.0);
    }

    #[test]
    fn test_unmatched_description_stays_unlinked() {
        let c = catalog();
        assert_eq!(c.resolve("Unknown Jumbo Pack"), None);
        assert_eq!(c.resolve(""), None);
    }
}
