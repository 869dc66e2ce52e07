use crate::Result;
use common::config;
pub use deadpool_diesel::postgres::Pool;
use deadpool_diesel::{Manager, ManagerConfig, RecyclingMethod};
use humantime::parse_duration;
use logging::{DEFAULT, debug, o};
use std::time::Duration;

const DEFAULT_MAX_SIZE: usize = 16;
const DEFAULT_RECYCLE: Duration = Duration::from_secs(299);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub dsn: String,
    pub max_size: usize,
    /// この時間を超えて生存した接続は破棄する
    pub recycle: Duration,
}

impl PoolSettings {
    /// `PG_DSN` / `PG_POOL_SIZE` / `PG_POOL_RECYCLE` から読み込む
    pub fn from_config() -> Result<Self> {
        let dsn = config::get("PG_DSN")?;
        let max_size: usize = config::get("PG_POOL_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_SIZE);
        let recycle = config::get("PG_POOL_RECYCLE")
            .and_then(|v| Ok(parse_duration(&v)?))
            .unwrap_or(DEFAULT_RECYCLE);
        Ok(Self {
            dsn,
            max_size,
            recycle,
        })
    }
}

pub fn new_pool(settings: &PoolSettings) -> Result<Pool> {
    let mgr_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(
        settings.dsn.clone(),
        deadpool_diesel::Runtime::Tokio1,
        mgr_config,
    );
    Ok(Pool::builder(mgr).max_size(settings.max_size).build()?)
}

/// `max_age` を超えた接続を同じ間隔で掃除するタスクを起動する
pub fn spawn_recycler(pool: Pool, max_age: Duration) -> tokio::task::JoinHandle<()> {
    let log = DEFAULT.new(o!(
        "function" => "spawn_recycler",
        "max_age" => format!("{max_age:?}"),
    ));
    let period = max_age.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let before = pool.status().size;
            let _ = pool.retain(|_, metrics| metrics.age() < max_age);
            let after = pool.status().size;
            if before != after {
                debug!(log, "recycled connections";
                    "dropped" => before.saturating_sub(after),
                    "remaining" => after,
                );
            }
        }
    })
}
