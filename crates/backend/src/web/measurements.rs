use super::AppState;
use super::error::AppError;
use super::html;
use super::sensors::find_sensor;
use axum::{
    Form, Router,
    extract::{Path, Query, State, rejection::FormRejection},
    response::{Html, Redirect},
    routing::get,
};
use chrono::{DateTime, NaiveDateTime};
use logging::{DEFAULT, debug, info, o, trace};
use persistence::NewMeasurement;
use serde::Deserialize;
use std::sync::Arc;

pub fn add_route(app: Router<Arc<AppState>>) -> Router<Arc<AppState>> {
    app.route(
        "/meas/{id}",
        get(list_measurements).post(record_measurement),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct MeasurementInput {
    value: Option<String>,
    time: Option<String>,
}

impl MeasurementInput {
    /// フォームの値を優先し、無ければクエリ文字列
    fn or(self, fallback: MeasurementInput) -> MeasurementInput {
        MeasurementInput {
            value: self.value.or(fallback.value),
            time: self.time.or(fallback.time),
        }
    }
}

/// 有限の数値と任意の測定時刻を取り出す
pub fn parse_input(input: &MeasurementInput) -> Result<(f64, Option<NaiveDateTime>), AppError> {
    let raw = input
        .value
        .as_deref()
        .ok_or_else(|| AppError::Validation("value is required".to_string()))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("value is not a number: {raw:?}")))?;
    if !value.is_finite() {
        return Err(AppError::Validation(format!("value is not finite: {raw:?}")));
    }

    let time = input.time.as_deref().map(parse_time).transpose()?;
    Ok((value, time))
}

fn parse_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.naive_utc())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, html::TIME_FORMAT))
        .map_err(|_| AppError::Validation(format!("time is not a timestamp: {raw:?}")))
}

async fn record_measurement(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<MeasurementInput>,
    form: Result<Form<MeasurementInput>, FormRejection>,
) -> Result<Redirect, AppError> {
    let log = DEFAULT.new(o!(
        "function" => "record_measurement",
        "sensor_id" => id,
    ));

    let input = match form {
        Ok(Form(form)) => form.or(query),
        Err(rejection) => {
            trace!(log, "no form body"; "reason" => %rejection);
            query
        }
    };
    let (value, time) = parse_input(&input).inspect_err(|e| {
        debug!(log, "rejected"; "error" => %e);
    })?;

    let measurement = match time {
        Some(time) => NewMeasurement::at(id, value, time),
        None => NewMeasurement::new(id, value),
    };
    let inserted = state.store.insert_measurement(measurement).await?;
    info!(log, "recorded"; "id" => inserted.id, "value" => inserted.value);
    Ok(Redirect::to("/"))
}

async fn list_measurements(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Html<String>, AppError> {
    let sensor = find_sensor(&state, id).await?;
    let measurements = state.store.list_measurements(id, None).await?;

    let mut body = format!(
        "<h1>{}</h1>\n<p>{} measurements</p>\n",
        html::escape(&sensor.name),
        measurements.len()
    );
    body.push_str("<table>\n<tr><th>Time</th><th>Value</th></tr>\n");
    for m in &measurements {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            html::format_time(&m.measure_time),
            m.value
        ));
    }
    body.push_str("</table>\n");

    Ok(html::page(&format!("{} measurements", sensor.name), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn input(value: Option<&str>, time: Option<&str>) -> MeasurementInput {
        MeasurementInput {
            value: value.map(str::to_string),
            time: time.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_plain_value() {
        let (value, time) = parse_input(&input(Some(" 3.5 "), None)).unwrap();
        assert_eq!(value, 3.5);
        assert_eq!(time, None);
    }

    #[test]
    fn test_rejects_bad_values() {
        for raw in ["abc", "", "NaN", "inf", "-infinity", "1,5"] {
            let err = parse_input(&input(Some(raw), None)).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{raw:?}");
        }
        assert!(matches!(
            parse_input(&input(None, None)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();

        let (_, time) = parse_input(&input(Some("1"), Some("2024-03-01 12:30:00"))).unwrap();
        assert_eq!(time, Some(expected));

        // オフセット付きは UTC に変換
        let (_, time) =
            parse_input(&input(Some("1"), Some("2024-03-01T21:30:00+09:00"))).unwrap();
        assert_eq!(time, Some(expected));

        assert!(matches!(
            parse_input(&input(Some("1"), Some("yesterday"))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_form_takes_precedence_over_query() {
        let merged = input(Some("1"), None).or(input(Some("2"), Some("2024-03-01 00:00:00")));
        assert_eq!(merged.value.as_deref(), Some("1"));
        assert_eq!(merged.time.as_deref(), Some("2024-03-01 00:00:00"));
    }
}
