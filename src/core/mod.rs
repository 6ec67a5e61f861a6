//! Core application primitives (orchestrator, scheduler, runtime)

pub mod orchestrator;
pub mod runtime;
pub mod scheduler;

pub use orchestrator::{Orchestrator, SymbolPipeline, TickReport};
pub use runtime::TradingRuntime;
pub use scheduler::{cron_expression, Job, JobScheduler};
