use crate::Result;
use crate::error::Error;
use crate::schema::sensors;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// 名前の最大長（VARCHAR(4096)）
pub const MAX_NAME_LENGTH: usize = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = sensors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Sensor {
    pub id: i32,
    pub name: String,
    pub creation: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sensors)]
pub struct NewSensor {
    pub name: String,
    pub creation: NaiveDateTime,
}

impl NewSensor {
    /// 名前を検証して作成時刻を現在時刻にする
    pub fn new(name: &str) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidSensorName("name is empty".to_string()).into());
        }
        let length = name.chars().count();
        if length > MAX_NAME_LENGTH {
            return Err(Error::InvalidSensorName(format!(
                "name is {length} characters, limit is {MAX_NAME_LENGTH}"
            ))
            .into());
        }
        Ok(Self {
            name: name.to_string(),
            creation: chrono::Utc::now().naive_utc(),
        })
    }

    pub fn insert(&self, conn: &mut PgConnection) -> QueryResult<Sensor> {
        diesel::insert_into(sensors::table)
            .values(self)
            .returning(Sensor::as_returning())
            .get_result(conn)
    }
}

impl Sensor {
    pub fn get(conn: &mut PgConnection, id: i32) -> QueryResult<Option<Sensor>> {
        sensors::table
            .find(id)
            .select(Sensor::as_select())
            .first(conn)
            .optional()
    }

    /// 登録順（id 昇順）
    pub fn get_all(conn: &mut PgConnection) -> QueryResult<Vec<Sensor>> {
        sensors::table
            .order(sensors::id.asc())
            .select(Sensor::as_select())
            .load(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sensor_sets_creation() {
        let before = chrono::Utc::now().naive_utc();
        let sensor = NewSensor::new("greenhouse").unwrap();
        assert_eq!(sensor.name, "greenhouse");
        assert!(sensor.creation >= before);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let err = NewSensor::new("   ").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidSensorName(_))
        ));
    }

    #[test]
    fn test_name_length_limit() {
        assert!(NewSensor::new(&"a".repeat(MAX_NAME_LENGTH)).is_ok());
        let err = NewSensor::new(&"a".repeat(MAX_NAME_LENGTH + 1)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::InvalidSensorName(_))
        ));
    }
}
