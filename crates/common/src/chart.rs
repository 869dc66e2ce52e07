//! 描画ライブラリに依存しないチャート記述
//!
//! 画像化やインタラクティブ表示はこの記述を受け取る側の責務とする。

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("no data to plot")]
    EmptySeries,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueAtTime {
    pub time: NaiveDateTime,
    pub value: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    /// `end` から `span` だけ遡った区間
    pub fn trailing(end: NaiveDateTime, span: Duration) -> Self {
        Self {
            start: end - span,
            end,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Day,
    Month,
    All,
}

/// 表示範囲を切り替えるプリセットボタン
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeButton {
    pub label: String,
    pub count: Option<u32>,
    pub step: Step,
}

impl RangeButton {
    pub fn backward(label: &str, count: u32, step: Step) -> Self {
        Self {
            label: label.to_string(),
            count: Some(count),
            step,
        }
    }

    pub fn all() -> Self {
        Self {
            label: "all".to_string(),
            count: None,
            step: Step::All,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelector {
    pub buttons: Vec<RangeButton>,
    pub slider: bool,
}

impl Default for RangeSelector {
    /// 1日 / 1週 / 1ヶ月 / 全期間 + スライダー
    fn default() -> Self {
        Self {
            buttons: vec![
                RangeButton::backward("1d", 1, Step::Day),
                RangeButton::backward("1w", 7, Step::Day),
                RangeButton::backward("1m", 1, Step::Month),
                RangeButton::all(),
            ],
            slider: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    title: String,
    x_label: String,
    y_label: String,
    points: Vec<ValueAtTime>,
    view: Option<TimeRange>,
    range_selector: Option<RangeSelector>,
}

impl ChartDescription {
    /// DB から新しい順に取得した系列を時系列順に並べ直して記述を作る
    pub fn from_newest_first(
        title: impl Into<String>,
        y_label: impl Into<String>,
        mut points: Vec<ValueAtTime>,
    ) -> Result<Self, ChartError> {
        if points.is_empty() {
            return Err(ChartError::EmptySeries);
        }
        points.reverse();
        Ok(Self {
            title: title.into(),
            x_label: "Time".to_string(),
            y_label: y_label.into(),
            points,
            view: None,
            range_selector: None,
        })
    }

    /// 初期表示の時間範囲
    pub fn with_view(mut self, view: TimeRange) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_range_selector(mut self, selector: RangeSelector) -> Self {
        self.range_selector = Some(selector);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    pub fn y_label(&self) -> &str {
        &self.y_label
    }

    /// 時系列順（古い → 新しい）、常に1件以上
    pub fn points(&self) -> &[ValueAtTime] {
        &self.points
    }

    pub fn view(&self) -> Option<&TimeRange> {
        self.view.as_ref()
    }

    pub fn range_selector(&self) -> Option<&RangeSelector> {
        self.range_selector.as_ref()
    }

    pub fn time_bounds(&self) -> TimeRange {
        let first = &self.points[0];
        let last = &self.points[self.points.len() - 1];
        TimeRange {
            start: first.time,
            end: last.time,
        }
    }

    pub fn value_bounds(&self) -> (f64, f64) {
        self.points
            .iter()
            .map(|p| p.value)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
                (min.min(v), max.max(v))
            })
    }
}
