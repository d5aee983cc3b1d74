pub mod book;
pub mod command;
pub mod config;
pub mod display;
pub mod logging;
pub mod period;
pub mod persistence;
pub mod planner;
pub mod resolver;
pub mod schedule;
pub mod time_of_day;
pub mod transfer;
pub mod validation;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use book::ScheduleBook;
pub use command::{Command, CommandError, Outcome};
pub use config::AppConfig;
pub use period::{Period, PeriodDraft};
pub use planner::{Planner, ScheduleStatus};
pub use resolver::{PeriodProgress, Resolution, resolve};
pub use schedule::{Schedule, ScheduleError};
pub use time_of_day::TimeOfDay;
