//! PostgreSQL を使わない `SensorStore` 実装（テスト用）

use crate::Result;
use crate::error::Error;
use crate::measurement::{Measurement, NewMeasurement};
use crate::sensor::{NewSensor, Sensor};
use crate::store::SensorStore;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Mutex;

#[derive(Default)]
struct Tables {
    sensors: Vec<Sensor>,
    measurements: Vec<Measurement>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|e| anyhow!("memory store poisoned: {e}"))?;
        f(&mut tables)
    }
}

fn newest_first(mut rows: Vec<Measurement>) -> Vec<Measurement> {
    rows.sort_by(|a, b| {
        b.measure_time
            .cmp(&a.measure_time)
            .then_with(|| b.id.cmp(&a.id))
    });
    rows
}

#[async_trait]
impl SensorStore for MemoryStore {
    async fn create_sensor(&self, name: &str) -> Result<Sensor> {
        let new_sensor = NewSensor::new(name)?;
        self.with_tables(|tables| {
            let sensor = Sensor {
                id: tables.sensors.len() as i32 + 1,
                name: new_sensor.name,
                creation: new_sensor.creation,
            };
            tables.sensors.push(sensor.clone());
            Ok(sensor)
        })
    }

    async fn get_sensor(&self, id: i32) -> Result<Option<Sensor>> {
        self.with_tables(|tables| Ok(tables.sensors.iter().find(|s| s.id == id).cloned()))
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        self.with_tables(|tables| Ok(tables.sensors.clone()))
    }

    async fn insert_measurement(&self, measurement: NewMeasurement) -> Result<Measurement> {
        self.with_tables(|tables| {
            if !tables.sensors.iter().any(|s| s.id == measurement.sensor_id) {
                return Err(Error::SensorNotFound(measurement.sensor_id).into());
            }
            let row = Measurement {
                id: tables.measurements.len() as i32 + 1,
                sensor_id: measurement.sensor_id,
                value: measurement.value,
                measure_time: measurement.measure_time,
            };
            tables.measurements.push(row.clone());
            Ok(row)
        })
    }

    async fn list_measurements(
        &self,
        sensor_id: i32,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>> {
        self.with_tables(|tables| {
            let rows = tables
                .measurements
                .iter()
                .filter(|m| m.sensor_id == sensor_id)
                .filter(|m| since.is_none_or(|since| m.measure_time >= since))
                .cloned()
                .collect();
            Ok(newest_first(rows))
        })
    }

    async fn latest_measurements(&self, sensor_id: i32, limit: usize) -> Result<Vec<Measurement>> {
        let mut rows = self.list_measurements(sensor_id, None).await?;
        rows.truncate(limit);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::exercise_store;

    #[tokio::test]
    async fn test_memory_store_contract() -> Result<()> {
        exercise_store(&MemoryStore::new()).await
    }
}
