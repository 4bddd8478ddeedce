//! Dashboard module
//!
//! Provides the reporting page showing order volume, revenue and customer
//! demographics for a user-selected date range.

mod aggregation;
mod cards;
mod charts;
mod handlers;

pub use handlers::{get_dashboard_page, update_date_range};
