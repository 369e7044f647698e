pub mod bills;
pub mod cache;
pub mod clock;
pub mod dates;
pub mod error;

use std::sync::Arc;

use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

pub use bills::batch::BatchResult;
pub use bills::generator::GenerationResult;
pub use bills::payment::{PayOptions, PaymentResult};
pub use bills::rules::{NewRecurringBill, RecurringBillChanges};
pub use bills::service::RecurringBillService;
pub use bills::skip::SkipResult;
pub use cache::{AggregateCache, CacheNamespace, NoopCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BillError, Result};

/// Returns a service wired the way it is used most of the time.
///
/// `today` freezes the clock at noon of that day; `None` reads the system
/// clock. Cache invalidation is a no-op.
pub fn default_service(db: DatabaseConnection, today: Option<NaiveDate>) -> RecurringBillService {
    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock::at_date(date)),
        None => Arc::new(SystemClock),
    };
    RecurringBillService::new(db, clock, Arc::new(NoopCache))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bills::testing::{TENANT, insert_bill, bill_template, setup_db, ymd};
    use model::entities::recurring_bill::Frequency;

    /// The default service generates from the frozen date.
    #[tokio::test]
    async fn test_default_service_uses_given_today() {
        let db = setup_db().await.expect("database");
        let bill = insert_bill(&db, bill_template(TENANT, 75, Frequency::Monthly, 10))
            .await
            .expect("bill");

        let service = default_service(db, Some(ymd(2025, 5, 11)));
        let result = service.generate(bill.id, TENANT, 2).await.unwrap();

        assert_eq!(result.dates, vec![ymd(2025, 6, 10), ymd(2025, 7, 10)]);
    }
}
