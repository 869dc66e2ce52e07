use super::error::AppError;
use super::html;
use super::AppState;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::get,
};
use logging::{DEFAULT, debug, info, o};
use persistence::Sensor;
use serde::Deserialize;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route("/", get(list_sensors).post(create_sensor))
        .route("/sens/{id}", get(show_sensor))
        .route("/{id}", get(show_sensor))
}

/// 存在しなければ 404
pub async fn find_sensor(state: &AppState, id: i32) -> Result<Sensor, AppError> {
    state
        .store
        .get_sensor(id)
        .await?
        .ok_or_else(|| AppError::sensor_not_found(id))
}

async fn list_sensors(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let sensors = state.store.list_sensors().await?;

    let mut body = String::from("<h1>Sensors</h1>\n");
    if sensors.is_empty() {
        body.push_str("<p>No sensors registered.</p>\n");
    } else {
        body.push_str("<table>\n<tr><th>ID</th><th>Name</th><th>Created</th><th></th></tr>\n");
        for sensor in &sensors {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                sensor.id,
                html::escape(&sensor.name),
                html::format_time(&sensor.creation),
                html::sensor_links(sensor.id),
            ));
        }
        body.push_str("</table>\n");
    }

    if state.settings.creation_enabled {
        body.push_str(
            r#"<form method="post" action="/">
<input type="text" name="contents" placeholder="sensor name" maxlength="4096">
<button type="submit">Add sensor</button>
</form>
"#,
        );
    }

    Ok(html::page("Sensors", &body))
}

#[derive(Debug, Deserialize)]
struct CreateSensorForm {
    contents: Option<String>,
}

async fn create_sensor(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CreateSensorForm>,
) -> Result<Redirect, AppError> {
    let log = DEFAULT.new(o!("function" => "create_sensor"));

    if !state.settings.creation_enabled {
        debug!(log, "sensor creation disabled, ignoring");
        return Ok(Redirect::to("/"));
    }

    let name = form
        .contents
        .ok_or_else(|| AppError::Validation("contents is required".to_string()))?;
    let sensor = state.store.create_sensor(&name).await?;
    info!(log, "created"; "id" => sensor.id);
    Ok(Redirect::to("/"))
}

async fn show_sensor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let sensor = find_sensor(&state, id).await?;
    let latest = state.store.latest_measurements(id, 1).await?;

    let name = html::escape(&sensor.name);
    let mut body = format!(
        "<h1>{name}</h1>\n<p>Created: {}</p>\n",
        html::format_time(&sensor.creation)
    );
    match latest.first() {
        Some(m) => body.push_str(&format!(
            "<p>Latest: {} at {}</p>\n",
            m.value,
            html::format_time(&m.measure_time)
        )),
        None => body.push_str("<p>No measurements yet.</p>\n"),
    }
    body.push_str(&format!("<p>{}</p>\n", html::sensor_links(id)));
    body.push_str(&format!(
        r#"<form method="post" action="/meas/{id}">
<input type="text" name="value" placeholder="value">
<button type="submit">Record</button>
</form>
"#
    ));

    Ok(html::page(&sensor.name, &body))
}
