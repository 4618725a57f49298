// ==========================================
// Incremental ingestion end-to-end tests
// ==========================================
// Goal: spreadsheet file -> classify -> extract -> resolve -> live store
// ==========================================


use rural_sales_ims::api::AnalyticsApi;
use rural_sales_ims::engine::{IngestPipeline, SheetIngestor};
use rural_sales_ims::logging;
use rural_sales_ims::repository::{CustomerRepository, DistributorRepository, SaleRepository};

#[tokio::test]
async fn test_complete_ingest_flow() {
    logging::init_test();
    let (_db_file, db_path) = test_helpers::create_test_db().expect("test db");
    let dir = tempfile::tempdir().expect("temp dir");

    let pipeline = IngestPipeline::open(&db_path).expect("pipeline");

    // Customer roster first.
    let roster = test_helpers::customer_roster_csv(&dir).expect("roster fixture");
    let report = pipeline.process_file(&roster).await.expect("roster ingest");
    assert!(report.processed_any());
    assert_eq!(report.customers_upserted, 2);

    // Sales ledger: two invoiced sales, one fully paid by G-Pay.
    let ledger = test_helpers::sales_ledger_csv(&dir).expect("ledger fixture");
    let report = pipeline.process_file(&ledger).await.expect("ledger ingest");
    assert_eq!(report.sales_created, 2);
    assert_eq!(report.sales_skipped_existing, 0);

    // Distributor roster without an explicit name column.
    let groups = test_helpers::distributor_roster_csv(&dir).expect("groups fixture");
    let report = pipeline.process_file(&groups).await.expect("groups ingest");
    assert_eq!(report.distributors_created, 1);

    let sales = SaleRepository::new(&db_path).expect("sale repo");
    assert_eq!(sales.count_sales().expect("count"), 2);

    let record = sales
        .get_by_invoice("INV001")
        .expect("query")
        .expect("INV001 present");
    assert_eq!(record.total_amount, 1360.0);
    let items = sales.items_for_sale(record.sale_id).expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2.0);
    assert_eq!(items[0].rate, 680.0);

    let distributors = DistributorRepository::new(&db_path).expect("dist repo");
    let listed = distributors.list().expect("list");
    assert_eq!(listed[0].name, "Amvad - Petlad");
    assert_eq!(listed[0].mantri_name, "Kiran Bhai");
    assert_eq!(listed[0].sabhasad_count, 42);
}

#[tokio::test]
async fn test_reingesting_same_file_is_idempotent() {
    logging::init_test();
    let (_db_file, db_path) = test_helpers::create_test_db().expect("test db");
    let dir = tempfile::tempdir().expect("temp dir");
    let ledger = test_helpers::sales_ledger_csv(&dir).expect("ledger fixture");

    let pipeline = IngestPipeline::open(&db_path).expect("pipeline");
    pipeline.process_file(&ledger).await.expect("first ingest");

    let customers = CustomerRepository::new(&db_path).expect("customer repo");
    let id_before = customers
        .find_by_name_mobile("Ramesh Patel", "")
        .expect("lookup")
        .expect("created on first pass");
    let count_before = customers.count().expect("count");

    let report = pipeline.process_file(&ledger).await.expect("second ingest");
    assert_eq!(report.sales_created, 0);
    assert_eq!(report.sales_skipped_existing, 2);

    // Same resolved customer id, no duplicates for the same name+mobile.
    let id_after = customers
        .find_by_name_mobile("Ramesh Patel", "")
        .expect("lookup")
        .expect("still present");
    assert_eq!(id_before, id_after);
    assert_eq!(customers.count().expect("count"), count_before);
}

#[tokio::test]
async fn test_analytics_over_ingested_store() {
    logging::init_test();
    let (_db_file, db_path) = test_helpers::create_test_db().expect("test db");
    let dir = tempfile::tempdir().expect("temp dir");
    let ledger = test_helpers::sales_ledger_csv(&dir).expect("ledger fixture");

    let pipeline = IngestPipeline::open(&db_path).expect("pipeline");
    pipeline.process_file(&ledger).await.expect("ingest");

    let analytics = AnalyticsApi::new(&db_path).expect("analytics");
    let summary = analytics.sales_summary(None, None).expect("summary");
    assert_eq!(summary.transactions, 2);
    assert_eq!(summary.total_revenue, 1360.0 + 850.0);
    assert_eq!(summary.paid_count, 1);
    assert_eq!(summary.pending_count, 1);

    // Only the unpaid invoice shows up for reminders.
    let pending = analytics.pending_payments().expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].invoice_no, "INV002");
    assert_eq!(pending[0].balance, 850.0);
}
