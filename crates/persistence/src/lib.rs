#![deny(warnings)]

pub mod connection_pool;
pub mod error;
pub mod measurement;
#[cfg(any(test, feature = "mock"))]
pub mod memory;
pub mod schema;
pub mod sensor;
pub mod store;

pub use error::Error;
pub use measurement::{Measurement, NewMeasurement};
pub use sensor::{NewSensor, Sensor};
pub use store::{PgStore, SensorStore};

type Result<T> = anyhow::Result<T>;
