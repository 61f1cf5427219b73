pub mod bootstrap;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod routing;
