mod api;
mod basic;
mod error;
mod html;
mod measurements;
mod plots;
mod sensors;

use axum::Router;
use common::config;
use humantime::parse_duration;
use logging::{DEFAULT, debug, info, o};
use persistence::SensorStore;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// ハンドラに渡す共有状態
pub struct AppState {
    pub store: Arc<dyn SensorStore>,
    pub settings: Settings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_address: String,
    pub creation_enabled: bool,
    /// `/plot` で描画する最新件数
    pub plot_limit: usize,
    /// `/new_plot` の対象期間、`/range_plot` の初期表示幅
    pub plot_window: chrono::Duration,
    pub average_count: usize,
    pub plot_size: (u32, u32),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            creation_enabled: true,
            plot_limit: 2000,
            plot_window: chrono::Duration::hours(24),
            average_count: 5,
            plot_size: (1850, 1050),
        }
    }
}

impl Settings {
    /// 読めない値は既定値にフォールバックする
    pub fn from_config() -> Self {
        let log = DEFAULT.new(o!("function" => "Settings::from_config"));
        let defaults = Self::default();

        fn parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
            config::get(name)
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        }

        let plot_window = config::get("PLOT_WINDOW")
            .ok()
            .and_then(|v| parse_duration(&v).ok())
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .unwrap_or(defaults.plot_window);

        let settings = Self {
            bind_address: config::get("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            creation_enabled: parsed("SENSOR_CREATION_ENABLED", defaults.creation_enabled),
            plot_limit: parsed("PLOT_LIMIT", defaults.plot_limit),
            plot_window,
            average_count: parsed("PLOT_AVERAGE_COUNT", defaults.average_count).max(1),
            plot_size: (
                parsed("PLOT_WIDTH", defaults.plot_size.0),
                parsed("PLOT_HEIGHT", defaults.plot_size.1),
            ),
        };
        debug!(log, "loaded"; "settings" => ?settings);
        settings
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    add_routes(
        Router::new(),
        &[
            basic::add_route,
            sensors::add_route,
            measurements::add_route,
            plots::add_route,
            api::add_route,
        ],
    )
    .with_state(Arc::new(state))
    .layer(cors)
}

pub async fn run(state: AppState) -> anyhow::Result<()> {
    let log = DEFAULT.new(o!("function" => "web::run"));
    let address = state.settings.bind_address.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(log, "listening"; "address" => &address);
    axum::serve(listener, app).await?;
    Ok(())
}

fn add_routes<T>(app: Router<T>, funcs: &[fn(Router<T>) -> Router<T>]) -> Router<T> {
    let mut app = app;
    for func in funcs {
        app = func(app);
    }
    app
}
