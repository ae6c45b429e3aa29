//! Work unit routing
//!
//! A pipeline's work units are known before anything runs:
//! - `ListRouter` - a fixed list of names (IMDB tables)
//! - `MonthRouter` - months reached by stepping a date cursor (taxi trips)

mod routers;
mod types;

pub use routers::{parse_duration, ListRouter, MonthRouter};
pub use types::{sanitize_table_name, PartitionRouter, WorkUnit};
