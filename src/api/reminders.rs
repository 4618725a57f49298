// ==========================================
// Rural Sales IMS - reminder dispatch
// ==========================================
// Composes payment and demo follow-up reminders from store queries and
// hands them to a NotificationSender. Sending is fire-and-forget: a
// failed send is logged and the loop continues, only store errors abort
// the run.
// ==========================================

use crate::api::analytics::AnalyticsApi;
use crate::api::error::ApiResult;
use crate::repository::DemoRepository;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Outbound message channel, consumed fire-and-forget.
pub trait NotificationSender: Send + Sync {
    fn send(&self, phone: &str, message: &str) -> anyhow::Result<()>;
}

/// Sender that writes messages to the log. Stands in where no real
/// messaging channel is configured.
pub struct ConsoleSender;

impl NotificationSender for ConsoleSender {
    fn send(&self, phone: &str, message: &str) -> anyhow::Result<()> {
        info!(phone, message, "notification");
        Ok(())
    }
}

/// Per-run counters; partial success is the normal outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderRun {
    pub sent: usize,
    pub skipped_no_phone: usize,
    pub failed: usize,
}

/// Digits-only phone with the country prefix added to bare 10-digit
/// numbers. None when too few digits remain to dial.
pub fn clean_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0..=9 => None,
        10 => Some(format!("91{digits}")),
        _ => Some(digits),
    }
}

pub struct ReminderService<S: NotificationSender> {
    analytics: AnalyticsApi,
    demos: DemoRepository,
    sender: S,
}

impl<S: NotificationSender> ReminderService<S> {
    pub fn new(analytics: AnalyticsApi, demos: DemoRepository, sender: S) -> Self {
        Self {
            analytics,
            demos,
            sender,
        }
    }

    fn dispatch(&self, run: &mut ReminderRun, mobile: &str, message: &str) {
        let phone = match clean_phone(mobile) {
            Some(p) => p,
            None => {
                run.skipped_no_phone += 1;
                return;
            }
        };
        match self.sender.send(&phone, message) {
            Ok(()) => run.sent += 1,
            Err(e) => {
                warn!(phone, error = %e, "reminder send failed");
                run.failed += 1;
            }
        }
    }

    /// One reminder per sale with an outstanding balance.
    pub fn send_payment_reminders(&self) -> ApiResult<ReminderRun> {
        let mut run = ReminderRun::default();
        for pending in self.analytics.pending_payments()? {
            let message = format!(
                "Dear {}, a payment of Rs {:.0} is pending against invoice {}. \
                 Kindly arrange the payment at your convenience.",
                pending.customer_name, pending.balance, pending.invoice_no
            );
            self.dispatch(&mut run, &pending.mobile, &message);
        }
        info!(sent = run.sent, skipped = run.skipped_no_phone, failed = run.failed,
              "payment reminders dispatched");
        Ok(run)
    }

    /// One reminder per demo whose follow-up is due and not converted.
    pub fn send_demo_follow_ups(&self, today: NaiveDate) -> ApiResult<ReminderRun> {
        let mut run = ReminderRun::default();
        for due in self.demos.due_follow_ups(today)? {
            let message = format!(
                "Namaste {}, following up on your product trial scheduled for {}. \
                 We would love to hear how it went.",
                due.customer_name, due.follow_up_date
            );
            self.dispatch(&mut run, &due.mobile, &message);
        }
        info!(sent = run.sent, skipped = run.skipped_no_phone, failed = run.failed,
              "demo follow-ups dispatched");
        Ok(run)
    }
}
