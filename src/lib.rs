// Library for tests to access modules

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod procfs;
pub mod rates;
pub mod replicate;
pub mod report;
pub mod routes;
pub mod session;
pub mod stats;
pub mod worker;

pub use error::MetricsError;
