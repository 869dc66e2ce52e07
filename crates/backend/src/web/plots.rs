use super::AppState;
use super::error::AppError;
use super::html;
use super::sensors::find_sensor;
use crate::chart::{plotly, png};
use axum::{
    Router,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use common::chart::{ChartDescription, RangeSelector, TimeRange, ValueAtTime};
use common::stats::Summary;
use logging::{DEFAULT, debug, o};
use persistence::{Measurement, Sensor};
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/plot/{id}", get(static_plot))
        .route("/new_plot/{id}", get(windowed_plot))
        .route("/range_plot/{id}", get(range_plot))
}

fn points(measurements: &[Measurement]) -> Vec<ValueAtTime> {
    measurements.iter().map(ValueAtTime::from).collect()
}

/// 要約値とチャート記述を一緒に作る（どちらも新しい順の系列が前提）
fn describe(
    title: String,
    sensor: &Sensor,
    newest_first: Vec<ValueAtTime>,
    average_count: usize,
) -> Result<(ChartDescription, Summary), AppError> {
    let summary = Summary::of(&newest_first, average_count).ok_or(AppError::NoData)?;
    let desc = ChartDescription::from_newest_first(title, sensor.name.clone(), newest_first)?;
    Ok((desc, summary))
}

/// 最新 `plot_limit` 件
pub async fn static_chart(state: &AppState, id: i32) -> Result<ChartDescription, AppError> {
    let sensor = find_sensor(state, id).await?;
    let rows = state
        .store
        .latest_measurements(id, state.settings.plot_limit)
        .await?;
    Ok(ChartDescription::from_newest_first(
        sensor.name.clone(),
        sensor.name,
        points(&rows),
    )?)
}

/// 直近 `plot_window` の測定値
pub async fn windowed_chart(
    state: &AppState,
    id: i32,
) -> Result<(Sensor, ChartDescription, Summary), AppError> {
    let sensor = find_sensor(state, id).await?;
    let since = chrono::Utc::now().naive_utc() - state.settings.plot_window;
    let rows = state.store.list_measurements(id, Some(since)).await?;
    let (desc, summary) = describe(
        sensor.name.clone(),
        &sensor,
        points(&rows),
        state.settings.average_count,
    )?;
    Ok((sensor, desc, summary))
}

/// 全履歴、初期表示は直近 `plot_window`
pub async fn range_chart(
    state: &AppState,
    id: i32,
) -> Result<(Sensor, ChartDescription, Summary), AppError> {
    let sensor = find_sensor(state, id).await?;
    let rows = state.store.list_measurements(id, None).await?;
    let (desc, summary) = describe(
        format!("{} Values", sensor.name),
        &sensor,
        points(&rows),
        state.settings.average_count,
    )?;
    let now = chrono::Utc::now().naive_utc();
    let desc = desc
        .with_view(TimeRange::trailing(now, state.settings.plot_window))
        .with_range_selector(RangeSelector::default());
    Ok((sensor, desc, summary))
}

async fn static_plot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let log = DEFAULT.new(o!(
        "function" => "static_plot",
        "sensor_id" => id,
    ));
    let desc = static_chart(&state, id).await?;
    let size = state.settings.plot_size;
    debug!(log, "rendering"; "points" => desc.points().len());

    let png = tokio::task::spawn_blocking(move || png::render(&desc, size))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

fn summary_html(summary: &Summary) -> String {
    format!(
        "<p>Last measurement: {}</p>\n<p>Average of last {}: {}</p>\n",
        html::format_time(&summary.last_time),
        summary.average_count,
        summary.average_value,
    )
}

async fn windowed_plot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let (sensor, desc, summary) = windowed_chart(&state, id).await?;

    let body = format!(
        r#"<h1>{name}</h1>
{summary}<div id="chart"></div>
<script>
var graphs = [{graph}];
Plotly.newPlot("chart", graphs[0]);
</script>
"#,
        name = html::escape(&sensor.name),
        summary = summary_html(&summary),
        graph = plotly::script_json(&plotly::plot(&desc)),
    );
    Ok(html::chart_page(&sensor.name, &body))
}

async fn range_plot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let (sensor, desc, summary) = range_chart(&state, id).await?;

    let body = format!(
        "<h1>{}</h1>\n{}{}",
        html::escape(desc.title()),
        summary_html(&summary),
        plotly::embed("chart", &plotly::plot(&desc)),
    );
    Ok(html::chart_page(&sensor.name, &body))
}
