// ==========================================
// Rural Sales IMS - API layer
// ==========================================
// Consumer-facing operations over the live store: aggregate analytics
// and reminder dispatch. The interactive front-end is a consumer of
// these interfaces, not part of this crate.
// ==========================================

pub mod analytics;
pub mod error;
pub mod reminders;

pub use analytics::{AnalyticsApi, PendingPayment, ProductPerformance, SalesSummary, VillageSales};
pub use error::{ApiError, ApiResult};
pub use reminders::{clean_phone, ConsoleSender, NotificationSender, ReminderRun, ReminderService};
