//! In-memory repository adapters.
//!
//! Each repository keeps its rows in a `tokio::sync::RwLock` and assigns
//! sequential ids. Data lives for the lifetime of the process; [`seed`]
//! provides the fixed demo data set loaded when `SEED_DEMO_DATA` is enabled.

mod activity_log;
mod alert;
mod measurement;
pub mod seed;
mod station;
mod token;
mod user;

pub use activity_log::MemoryActivityLogRepository;
pub use alert::{MemoryAlertConfigurationRepository, MemoryAlertRepository};
pub use measurement::MemoryMeasurementRepository;
pub use station::MemoryStationRepository;
pub use token::MemoryTokenRepository;
pub use user::MemoryUserRepository;

/// Rows plus the next id to hand out.
#[derive(Debug)]
struct Table<T> {
    rows: Vec<T>,
    next_id: i64,
}

impl<T> Table<T> {
    fn new(rows: Vec<T>, id_of: impl Fn(&T) -> i64) -> Self {
        let next_id = rows.iter().map(id_of).max().unwrap_or(0) + 1;
        Self { rows, next_id }
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
