use crate::Result;
use crate::connection_pool::Pool;
use crate::error::Error;
use crate::measurement::{Measurement, NewMeasurement};
use crate::sensor::{NewSensor, Sensor};
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::PgConnection;
use diesel::result::{DatabaseErrorKind, Error as DieselError, QueryResult};
use logging::{DEFAULT, debug, info, o, trace};

/// センサーと測定値の永続化インターフェース
///
/// 取得系はすべて `measure_time` の新しい順で返す。
#[async_trait]
pub trait SensorStore: Send + Sync {
    async fn create_sensor(&self, name: &str) -> Result<Sensor>;

    async fn get_sensor(&self, id: i32) -> Result<Option<Sensor>>;

    /// 登録順
    async fn list_sensors(&self) -> Result<Vec<Sensor>>;

    /// 存在しないセンサーへの挿入は `Error::SensorNotFound`
    async fn insert_measurement(&self, measurement: NewMeasurement) -> Result<Measurement>;

    async fn list_measurements(
        &self,
        sensor_id: i32,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>>;

    async fn latest_measurements(&self, sensor_id: i32, limit: usize) -> Result<Vec<Measurement>>;
}

pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    async fn run<F, T>(&self, f: F) -> Result<QueryResult<T>>
    where
        F: FnOnce(&mut PgConnection) -> QueryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await?;
        conn.interact(f)
            .await
            .map_err(|e| anyhow!("Database interaction error: {:?}", e))
    }
}

#[async_trait]
impl SensorStore for PgStore {
    async fn create_sensor(&self, name: &str) -> Result<Sensor> {
        let log = DEFAULT.new(o!("function" => "create_sensor"));
        let new_sensor = NewSensor::new(name)?;
        let sensor = self.run(move |conn| new_sensor.insert(conn)).await??;
        info!(log, "sensor created"; "id" => sensor.id, "name" => &sensor.name);
        Ok(sensor)
    }

    async fn get_sensor(&self, id: i32) -> Result<Option<Sensor>> {
        Ok(self.run(move |conn| Sensor::get(conn, id)).await??)
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>> {
        Ok(self.run(Sensor::get_all).await??)
    }

    async fn insert_measurement(&self, measurement: NewMeasurement) -> Result<Measurement> {
        let log = DEFAULT.new(o!(
            "function" => "insert_measurement",
            "sensor_id" => measurement.sensor_id,
        ));
        let sensor_id = measurement.sensor_id;
        match self.run(move |conn| measurement.insert(conn)).await? {
            Ok(inserted) => {
                trace!(log, "inserted"; "id" => inserted.id, "value" => inserted.value);
                Ok(inserted)
            }
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info)) => {
                debug!(log, "foreign key violation"; "message" => info.message());
                Err(Error::SensorNotFound(sensor_id).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list_measurements(
        &self,
        sensor_id: i32,
        since: Option<NaiveDateTime>,
    ) -> Result<Vec<Measurement>> {
        Ok(self
            .run(move |conn| Measurement::list_by_sensor(conn, sensor_id, since))
            .await??)
    }

    async fn latest_measurements(&self, sensor_id: i32, limit: usize) -> Result<Vec<Measurement>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        Ok(self
            .run(move |conn| Measurement::latest_by_sensor(conn, sensor_id, limit))
            .await??)
    }
}

#[cfg(test)]
pub(crate) mod tests;
