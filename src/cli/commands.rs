pub mod daily;
pub mod generate;
pub mod initdb;
pub mod upcoming;

pub use daily::{reconcile_overdue, run_daily};
pub use generate::generate;
pub use initdb::init_database;
pub use upcoming::upcoming;
