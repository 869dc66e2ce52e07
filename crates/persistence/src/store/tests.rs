use super::*;
use crate::connection_pool::{self, PoolSettings};
use chrono::Duration;
use serial_test::serial;

/// どの実装でも満たすべき振る舞い
///
/// 既存データがあっても通るよう、自分で作ったセンサーだけを検証する。
pub(crate) async fn exercise_store(store: &dyn SensorStore) -> Result<()> {
    let started = chrono::Utc::now().naive_utc();

    // センサー作成と取得
    let first = store.create_sensor("outdoor temperature").await?;
    let second = store.create_sensor("humidity").await?;
    assert_ne!(first.id, second.id);
    assert_eq!(first.name, "outdoor temperature");
    assert!(first.creation >= started);

    let fetched = store.get_sensor(first.id).await?;
    assert_eq!(fetched.as_ref(), Some(&first));
    assert_eq!(store.get_sensor(i32::MAX).await?, None);

    let all = store.list_sensors().await?;
    let first_pos = all.iter().position(|s| s.id == first.id).unwrap();
    let second_pos = all.iter().position(|s| s.id == second.id).unwrap();
    assert!(first_pos < second_pos, "sensors should be in insertion order");

    // 不正な名前
    let err = store.create_sensor("").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::InvalidSensorName(_))
    ));

    // 測定値は新しい順、センサーごとに分離される
    let now = chrono::Utc::now().naive_utc();
    let old = now - Duration::hours(30);
    store
        .insert_measurement(NewMeasurement::at(first.id, 1.0, old))
        .await?;
    store
        .insert_measurement(NewMeasurement::at(first.id, 2.0, now - Duration::hours(2)))
        .await?;
    store
        .insert_measurement(NewMeasurement::at(first.id, 3.0, now - Duration::hours(1)))
        .await?;
    store
        .insert_measurement(NewMeasurement::at(second.id, 99.0, now))
        .await?;

    let listed = store.list_measurements(first.id, None).await?;
    let values: Vec<f64> = listed.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![3.0, 2.0, 1.0]);
    assert!(listed.iter().all(|m| m.sensor_id == first.id));

    // since による絞り込み
    let recent = store
        .list_measurements(first.id, Some(now - Duration::hours(24)))
        .await?;
    let values: Vec<f64> = recent.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![3.0, 2.0]);

    // 件数制限
    let latest = store.latest_measurements(first.id, 2).await?;
    let values: Vec<f64> = latest.iter().map(|m| m.value).collect();
    assert_eq!(values, vec![3.0, 2.0]);
    assert_eq!(store.latest_measurements(first.id, 0).await?.len(), 0);

    // 存在しないセンサーへの挿入
    let err = store
        .insert_measurement(NewMeasurement::new(i32::MAX, 1.0))
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::SensorNotFound(i32::MAX))
    );

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore] // requires PostgreSQL with migrations applied (PG_DSN)
async fn test_pg_store_contract() -> Result<()> {
    let settings = PoolSettings::from_config()?;
    let pool = connection_pool::new_pool(&settings)?;
    exercise_store(&PgStore::new(pool)).await
}
