use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::dashboard_dto::{AdminDashboard, CustomerDashboard, DriverDashboard};
use crate::repositories::invoice_repository::InvoiceRepository;
use crate::repositories::trip_repository::{TripFilter, TripRepository};
use crate::repositories::user_repository::UserRepository;
use crate::utils::errors::AppError;

pub struct DashboardController {
    trips: TripRepository,
    invoices: InvoiceRepository,
    users: UserRepository,
}

impl DashboardController {
    pub fn new(pool: PgPool) -> Self {
        Self {
            trips: TripRepository::new(pool.clone()),
            invoices: InvoiceRepository::new(pool.clone()),
            users: UserRepository::new(pool),
        }
    }

    pub async fn admin(&self) -> Result<AdminDashboard, AppError> {
        let trips_by_status = self.trips.counts_by_status(TripFilter::default()).await?;
        let (active_drivers, available_drivers) = self.users.driver_counts().await?;
        let receivables = self.invoices.summary(None).await?;

        Ok(AdminDashboard {
            trips_by_status,
            active_drivers,
            available_drivers,
            revenue_invoiced: receivables.total_invoiced,
            revenue_collected: receivables.total_collected,
            overdue_invoices: receivables.overdue_count,
        })
    }

    pub async fn driver(&self, driver_id: Uuid) -> Result<DriverDashboard, AppError> {
        let filter = TripFilter {
            driver_id: Some(driver_id),
            ..Default::default()
        };
        Ok(DriverDashboard {
            trips_by_status: self.trips.counts_by_status(filter).await?,
            current_trip: self.trips.current_for_driver(driver_id).await?,
        })
    }

    pub async fn customer(&self, customer_id: Uuid) -> Result<CustomerDashboard, AppError> {
        let filter = TripFilter {
            customer_id: Some(customer_id),
            ..Default::default()
        };
        Ok(CustomerDashboard {
            trips_by_status: self.trips.counts_by_status(filter).await?,
            outstanding_balance: self.invoices.summary(Some(customer_id)).await?.total_outstanding,
        })
    }
}
