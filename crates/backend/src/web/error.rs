use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::chart::ChartError;
use logging::{DEFAULT, error, o};
use thiserror::Error;

/// ハンドラの失敗をステータスコードへ対応付ける
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("no data to plot")]
    NoData,
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("internal server error")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn sensor_not_found(id: i32) -> Self {
        AppError::NotFound(format!("sensor {id}"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::NoData => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<persistence::Error>() {
            return match e {
                persistence::Error::SensorNotFound(id) => AppError::sensor_not_found(*id),
                persistence::Error::InvalidSensorName(reason) => {
                    AppError::Validation(reason.clone())
                }
            };
        }
        if let Some(ChartError::EmptySeries) = err.downcast_ref::<ChartError>() {
            return AppError::NoData;
        }
        AppError::Internal(err)
    }
}

impl From<ChartError> for AppError {
    fn from(err: ChartError) -> Self {
        match err {
            ChartError::EmptySeries => AppError::NoData,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AppError::Internal(e) = &self {
            let log = DEFAULT.new(o!("function" => "AppError::into_response"));
            error!(log, "request failed"; "error" => ?e);
        }
        (status, self.to_string()).into_response()
    }
}
