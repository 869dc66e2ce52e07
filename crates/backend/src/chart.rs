//! `ChartDescription` の描画
//!
//! - `png`: plotters によるラスタ画像
//! - `plotly`: ブラウザ側で描画する Plotly 用の JSON / HTML 断片

pub mod plotly;
pub mod png;
