use crate::schema::measurements;
use crate::sensor::Sensor;
use chrono::NaiveDateTime;
use common::chart::ValueAtTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable, Associations,
)]
#[diesel(table_name = measurements)]
#[diesel(belongs_to(Sensor, foreign_key = sensor_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Measurement {
    pub id: i32,
    pub sensor_id: i32,
    pub value: f64,
    pub measure_time: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = measurements)]
pub struct NewMeasurement {
    pub sensor_id: i32,
    pub value: f64,
    pub measure_time: NaiveDateTime,
}

impl NewMeasurement {
    /// 測定時刻は現在時刻
    pub fn new(sensor_id: i32, value: f64) -> Self {
        Self::at(sensor_id, value, chrono::Utc::now().naive_utc())
    }

    pub fn at(sensor_id: i32, value: f64, measure_time: NaiveDateTime) -> Self {
        Self {
            sensor_id,
            value,
            measure_time,
        }
    }

    pub fn insert(&self, conn: &mut PgConnection) -> QueryResult<Measurement> {
        diesel::insert_into(measurements::table)
            .values(self)
            .returning(Measurement::as_returning())
            .get_result(conn)
    }
}

impl Measurement {
    /// センサーの測定値を新しい順に取得（`since` 以降に限定可能）
    pub fn list_by_sensor(
        conn: &mut PgConnection,
        sensor_id: i32,
        since: Option<NaiveDateTime>,
    ) -> QueryResult<Vec<Measurement>> {
        let mut query = measurements::table
            .filter(measurements::sensor_id.eq(sensor_id))
            .into_boxed();
        if let Some(since) = since {
            query = query.filter(measurements::measure_time.ge(since));
        }
        query
            .order((measurements::measure_time.desc(), measurements::id.desc()))
            .select(Measurement::as_select())
            .load(conn)
    }

    /// 最新 `limit` 件を新しい順に取得
    pub fn latest_by_sensor(
        conn: &mut PgConnection,
        sensor_id: i32,
        limit: i64,
    ) -> QueryResult<Vec<Measurement>> {
        measurements::table
            .filter(measurements::sensor_id.eq(sensor_id))
            .order((measurements::measure_time.desc(), measurements::id.desc()))
            .limit(limit)
            .select(Measurement::as_select())
            .load(conn)
    }
}

impl From<&Measurement> for ValueAtTime {
    fn from(m: &Measurement) -> Self {
        ValueAtTime {
            time: m.measure_time,
            value: m.value,
        }
    }
}
