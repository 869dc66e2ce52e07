use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Sensor not found: {0}")]
    SensorNotFound(i32),
    #[error("Invalid sensor name: {0}")]
    InvalidSensorName(String),
}
