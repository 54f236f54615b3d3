#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]

pub mod health;
pub mod health_watch;
pub mod http;
pub mod polling;
pub mod relay;
pub mod router;
pub mod stats;

pub use health::HealthMonitor;
pub use health_watch::HealthWatcher;
pub use http::{HomeHttpClient, QueueHttpClient};
pub use polling::{JobPollingEngine, poll_interval};
pub use relay::{RelayError, StreamRelay};
pub use router::{Dispatch, FailoverRouter, Routed, RouterError, WakeOutcome};
pub use stats::StatsCollector;
