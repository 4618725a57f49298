// ==========================================
// Rural Sales IMS - CLI entry point
// ==========================================
// Subcommands:
//   init            create the schema and seed the product catalog
//   ingest <file>   ingest one workbook into the live store
//   batch [dir]     standardize every workbook in a directory
//   remind          dispatch payment and demo follow-up reminders
// ==========================================

use rural_sales_ims::api::{AnalyticsApi, ConsoleSender, ReminderService};
use rural_sales_ims::config::AppConfig;
use rural_sales_ims::engine::{BatchStandardizer, IngestPipeline, SheetIngestor};
use rural_sales_ims::repository::DemoRepository;
use std::process::ExitCode;
use tracing::{error, info};

fn print_usage() {
    eprintln!("usage: rural-sales-ims <command>");
    eprintln!();
    eprintln!("commands:");
    eprintln!("  init            create the schema and seed the product catalog");
    eprintln!("  ingest <file>   ingest one workbook (.xlsx/.xls/.csv) into the store");
    eprintln!("  batch [dir]     standardize every workbook in a directory");
    eprintln!("  remind          dispatch payment and demo follow-up reminders");
}

async fn run(config: &AppConfig, args: &[String]) -> anyhow::Result<bool> {
    match args.first().map(String::as_str) {
        Some("init") => {
            let pipeline = IngestPipeline::open(config.db_path_str())?;
            info!(db = %config.db_path.display(), products = pipeline.catalog().len(),
                  "store initialized");
            println!("store ready at {}", config.db_path.display());
            Ok(true)
        }
        Some("ingest") => {
            let file = match args.get(1) {
                Some(f) => f,
                None => {
                    eprintln!("ingest: missing file argument");
                    print_usage();
                    return Ok(false);
                }
            };
            let pipeline = IngestPipeline::open(config.db_path_str())?;
            let report = pipeline.process_file(file).await?;
            println!(
                "{}: {}/{} sheets processed, {} sales ({} already present), \
                 {} customers, {} distributors, {} rows skipped",
                report.file,
                report.sheets_processed,
                report.sheets_total,
                report.sales_created,
                report.sales_skipped_existing,
                report.customers_upserted,
                report.distributors_created,
                report.rows_skipped,
            );
            Ok(report.processed_any() || report.sales_skipped_existing > 0)
        }
        Some("batch") => {
            let data_dir = args
                .get(1)
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|| config.data_dir.clone());
            let standardizer = BatchStandardizer::new(data_dir, config.export_dir.clone());
            let (_, report) = standardizer.process_all_files().await?;
            println!(
                "{}/{} files processed ({} failed, {} unidentified sheets)",
                report.files_processed, report.files_total, report.files_failed,
                report.sheets_unknown,
            );
            println!(
                "{} customers, {} sales, {} sale items, {} distributors -> {}",
                report.customers, report.sales, report.sale_items, report.distributors,
                config.export_dir.display(),
            );
            Ok(report.files_failed < report.files_total || report.files_total == 0)
        }
        Some("remind") => {
            let analytics = AnalyticsApi::new(config.db_path_str())?;
            let demos = DemoRepository::new(config.db_path_str())?;
            let service = ReminderService::new(analytics, demos, ConsoleSender);

            let payments = service.send_payment_reminders()?;
            let today = chrono::Local::now().date_naive();
            let follow_ups = service.send_demo_follow_ups(today)?;
            println!(
                "payment reminders: {} sent, {} without phone, {} failed",
                payments.sent, payments.skipped_no_phone, payments.failed
            );
            println!(
                "demo follow-ups: {} sent, {} without phone, {} failed",
                follow_ups.sent, follow_ups.skipped_no_phone, follow_ups.failed
            );
            Ok(true)
        }
        _ => {
            print_usage();
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    rural_sales_ims::logging::init();
    info!("{} v{}", rural_sales_ims::APP_NAME, rural_sales_ims::VERSION);

    let config = AppConfig::load_or_default();
    if let Err(e) = config.ensure_dirs() {
        error!(error = %e, "cannot create data directories");
        return ExitCode::FAILURE;
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&config, &args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
