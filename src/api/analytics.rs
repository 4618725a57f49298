// ==========================================
// Rural Sales IMS - analytics queries
// ==========================================
// Read-only aggregate queries consumed by the dashboard and the weekly
// report job. All computation happens in SQL over the live store.
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::db::open_sqlite_connection;
use crate::repository::RepositoryError;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Aggregate figures over a date range.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub transactions: i64,
    pub total_revenue: f64,
    pub avg_sale_value: f64,
    pub unique_customers: i64,
    pub total_paid: f64,
    pub pending_amount: f64,
    pub paid_count: i64,
    pub pending_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageSales {
    pub village: String,
    pub transactions: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub product_name: String,
    pub units_sold: f64,
    pub revenue: f64,
}

/// One outstanding sale with the contact fields a reminder needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPayment {
    pub sale_id: i64,
    pub invoice_no: String,
    pub customer_name: String,
    pub mobile: String,
    pub village: String,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub balance: f64,
}

pub struct AnalyticsApi {
    conn: Arc<Mutex<Connection>>,
}

impl AnalyticsApi {
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::from)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> ApiResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| ApiError::Store(RepositoryError::LockError(e.to_string())))
    }

    /// Sales summary over an inclusive date range; unbounded when None.
    /// Undated sales are included only in the unbounded query.
    pub fn sales_summary(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> ApiResult<SalesSummary> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(ApiError::InvalidInput(format!(
                    "date range inverted: {f} > {t}"
                )));
            }
        }

        let from = from.map(|d| d.format("%Y-%m-%d").to_string());
        let to = to.map(|d| d.format("%Y-%m-%d").to_string());
        let conn = self.get_conn()?;
        let summary = conn
            .query_row(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(s.total_amount), 0),
                    COALESCE(AVG(s.total_amount), 0),
                    COUNT(DISTINCT s.customer_id),
                    COALESCE(SUM(p.paid), 0),
                    COALESCE(SUM(CASE WHEN s.payment_status = 'Paid' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN s.payment_status != 'Paid' THEN 1 ELSE 0 END), 0)
                FROM sales s
                LEFT JOIN (SELECT sale_id, SUM(amount) AS paid
                           FROM payments GROUP BY sale_id) p
                       ON p.sale_id = s.sale_id
                WHERE (?1 IS NULL OR s.sale_date >= ?1)
                  AND (?2 IS NULL OR s.sale_date <= ?2)
                "#,
                params![from, to],
                |row| {
                    let total_revenue: f64 = row.get(1)?;
                    let total_paid: f64 = row.get(4)?;
                    Ok(SalesSummary {
                        transactions: row.get(0)?,
                        total_revenue,
                        avg_sale_value: row.get(2)?,
                        unique_customers: row.get(3)?,
                        total_paid,
                        pending_amount: total_revenue - total_paid,
                        paid_count: row.get(5)?,
                        pending_count: row.get(6)?,
                    })
                },
            )
            .map_err(RepositoryError::from)?;
        Ok(summary)
    }

    /// Revenue per customer village, highest first.
    pub fn village_sales(&self) -> ApiResult<Vec<VillageSales>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT c.village, COUNT(s.sale_id), COALESCE(SUM(s.total_amount), 0)
                FROM sales s
                JOIN customers c ON c.customer_id = s.customer_id
                WHERE c.village != ''
                GROUP BY c.village
                ORDER BY SUM(s.total_amount) DESC
                "#,
            )
            .map_err(RepositoryError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(VillageSales {
                    village: row.get(0)?,
                    transactions: row.get(1)?,
                    revenue: row.get(2)?,
                })
            })
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;
        Ok(rows)
    }

    /// Units and revenue per catalog product, highest revenue first.
    pub fn product_performance(&self) -> ApiResult<Vec<ProductPerformance>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT p.product_name,
                       COALESCE(SUM(i.quantity), 0),
                       COALESCE(SUM(i.amount), 0)
                FROM products p
                LEFT JOIN sale_items i ON i.product_id = p.product_id
                GROUP BY p.product_id
                ORDER BY SUM(i.amount) DESC
                "#,
            )
            .map_err(RepositoryError::from)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(ProductPerformance {
                    product_name: row.get(0)?,
                    units_sold: row.get(1)?,
                    revenue: row.get(2)?,
                })
            })
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;
        Ok(rows)
    }

    /// Sales not fully paid, with the customer contact fields reminders
    /// need. Paid amounts come from the payments table.
    pub fn pending_payments(&self) -> ApiResult<Vec<PendingPayment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn
            .prepare(
                r#"
                SELECT s.sale_id, s.invoice_no, c.name, c.mobile, c.village,
                       s.total_amount,
                       COALESCE((SELECT SUM(p.amount) FROM payments p
                                 WHERE p.sale_id = s.sale_id), 0) AS paid
                FROM sales s
                JOIN customers c ON c.customer_id = s.customer_id
                WHERE s.payment_status != 'Paid'
                ORDER BY s.total_amount DESC
                "#,
            )
            .map_err(RepositoryError::from)?;
        let rows = stmt
            .query_map([], |row| {
                let total_amount: f64 = row.get(5)?;
                let paid_amount: f64 = row.get(6)?;
                Ok(PendingPayment {
                    sale_id: row.get(0)?,
                    invoice_no: row.get(1)?,
                    customer_name: row.get(2)?,
                    mobile: row.get(3)?,
                    village: row.get(4)?,
                    total_amount,
                    paid_amount,
                    balance: total_amount - paid_amount,
                })
            })
            .map_err(RepositoryError::from)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::from)?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sale::{NewSaleItem, PaymentInput, SaleCandidate};
    use crate::domain::sheet::Provenance;
    use crate::engine::IngestPipeline;
    use crate::repository::{CustomerRepository, SaleRepository};
    use crate::domain::customer::CustomerCandidate;

    fn seeded() -> (Arc<Mutex<Connection>>, CustomerRepository, SaleRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        // Schema and catalog via the pipeline constructor.
        IngestPipeline::from_connection(conn.clone()).unwrap();
        let customers = CustomerRepository::from_connection(conn.clone()).unwrap();
        let sales = SaleRepository::from_connection(conn.clone()).unwrap();
        (conn, customers, sales)
    }

    fn sale(invoice: &str, amount: f64, village: &str, date: &str) -> SaleCandidate {
        SaleCandidate {
            invoice_no: invoice.to_string(),
            customer_name: format!("Customer {invoice}"),
            village: village.to_string(),
            sale_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            total_amount: amount,
            provenance: Provenance::new("ledger.xlsx", "March"),
            ..SaleCandidate::default()
        }
    }

    fn add(customers: &CustomerRepository, sales: &SaleRepository, s: &SaleCandidate, paid: f64) {
        let customer_id = customers
            .get_or_create(&CustomerCandidate {
                name: s.customer_name.clone(),
                village: s.village.clone(),
                mobile: "9876500001".to_string(),
                provenance: s.provenance.clone(),
                ..CustomerCandidate::default()
            })
            .unwrap();
        let items = [NewSaleItem {
            product_id: Some(4),
            quantity: 1.0,
            rate: s.total_amount,
            amount: s.total_amount,
            liters: 5.0,
        }];
        let payments: Vec<PaymentInput> = if paid > 0.0 {
            vec![PaymentInput {
                payment_date: s.sale_date,
                method: "Cash".to_string(),
                amount: paid,
                rrn: String::new(),
                reference: String::new(),
            }]
        } else {
            Vec::new()
        };
        sales.add_sale(s, customer_id, &items, &payments).unwrap();
    }

    #[test]
    fn test_summary_counts_and_pending_split() {
        let (conn, customers, sales) = seeded();
        add(&customers, &sales, &sale("INV001", 680.0, "Amiyad", "2025-03-01"), 680.0);
        add(&customers, &sales, &sale("INV002", 1300.0, "Amvad", "2025-03-10"), 0.0);

        let api = AnalyticsApi::from_connection(conn);
        let summary = api.sales_summary(None, None).unwrap();

        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.total_revenue, 1980.0);
        assert_eq!(summary.paid_count, 1);
        assert_eq!(summary.pending_count, 1);
        assert_eq!(summary.pending_amount, 1300.0);
    }

    #[test]
    fn test_summary_respects_date_range() {
        let (conn, customers, sales) = seeded();
        add(&customers, &sales, &sale("INV001", 680.0, "Amiyad", "2025-03-01"), 0.0);
        add(&customers, &sales, &sale("INV002", 1300.0, "Amvad", "2025-04-10"), 0.0);

        let api = AnalyticsApi::from_connection(conn);
        let march = api
            .sales_summary(
                NaiveDate::from_ymd_opt(2025, 3, 1),
                NaiveDate::from_ymd_opt(2025, 3, 31),
            )
            .unwrap();
        assert_eq!(march.transactions, 1);
        assert_eq!(march.total_revenue, 680.0);

        let inverted = api.sales_summary(
            NaiveDate::from_ymd_opt(2025, 4, 1),
            NaiveDate::from_ymd_opt(2025, 3, 1),
        );
        assert!(matches!(inverted, Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_pending_payments_carry_contact_and_balance() {
        let (conn, customers, sales) = seeded();
        add(&customers, &sales, &sale("INV001", 1000.0, "Amiyad", "2025-03-01"), 400.0);

        let api = AnalyticsApi::from_connection(conn);
        let pending = api.pending_payments().unwrap();

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].invoice_no, "INV001");
        assert_eq!(pending[0].mobile, "9876500001");
        assert_eq!(pending[0].paid_amount, 400.0);
        assert_eq!(pending[0].balance, 600.0);
    }

    #[test]
    fn test_village_sales_ordered_by_revenue() {
        let (conn, customers, sales) = seeded();
        add(&customers, &sales, &sale("INV001", 680.0, "Amiyad", "2025-03-01"), 0.0);
        add(&customers, &sales, &sale("INV002", 2950.0, "Amvad", "2025-03-02"), 0.0);

        let api = AnalyticsApi::from_connection(conn);
        let villages = api.village_sales().unwrap();

        assert_eq!(villages.len(), 2);
        assert_eq!(villages[0].village, "Amvad");
        assert_eq!(villages[0].revenue, 2950.0);
    }
}
