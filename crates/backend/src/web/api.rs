use super::AppState;
use super::error::AppError;
use super::plots::windowed_chart;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use common::chart::ChartDescription;
use common::stats::Summary;
use serde::Serialize;
use std::sync::Arc;

fn path(sub: &str) -> String {
    format!("/api/{sub}")
}

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route(&path("chart/{id}"), get(get_chart))
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub sensor_id: i32,
    pub chart: ChartDescription,
    pub summary: Summary,
}

/// `/new_plot` と同じ系列を描画ライブラリに依存しない形で返す
async fn get_chart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ChartResponse>, AppError> {
    let (sensor, chart, summary) = windowed_chart(&state, id).await?;
    Ok(Json(ChartResponse {
        sensor_id: sensor.id,
        chart,
        summary,
    }))
}
