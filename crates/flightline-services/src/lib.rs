//! flightline-services — registries, listeners, and protocol clients shared
//! by the three role binaries.

pub mod client;
pub mod control;
pub mod mapper;
pub mod records;
pub mod registry;
pub mod workers;

pub use client::{fetch_control_log, visit_control, ClientError, MapperClient};
pub use control::ControlListener;
pub use mapper::MapperListener;
pub use records::{AirplaneRecord, AirportRecord};
pub use registry::{
    new_airport_directory, new_visit_log, AirportDirectory, Keyed, OnEqual, SortedRegistry,
    VisitLog,
};
pub use workers::{WorkerGate, WorkerPolicy};
