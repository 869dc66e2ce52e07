#![deny(warnings)]

mod chart;
mod web;

use logging::{DEFAULT, crit, info, o};
use persistence::PgStore;
use persistence::connection_pool::{self, PoolSettings};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let log = DEFAULT.new(o!("function" => "main"));
    info!(log, "Starting up");

    if let Err(e) = run().await {
        crit!(log, "server stopped"; "error" => ?e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let log = DEFAULT.new(o!("function" => "run"));

    let pool_settings = PoolSettings::from_config()?;
    info!(log, "connection pool";
        "max_size" => pool_settings.max_size,
        "recycle" => ?pool_settings.recycle,
    );
    let pool = connection_pool::new_pool(&pool_settings)?;
    connection_pool::spawn_recycler(pool.clone(), pool_settings.recycle);

    let settings = web::Settings::from_config();
    let state = web::AppState {
        store: Arc::new(PgStore::new(pool)),
        settings,
    };
    web::run(state).await
}
