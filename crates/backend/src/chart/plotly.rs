use common::chart::{ChartDescription, RangeSelector, Step};
use plotly::common::Title;
use plotly::layout::{
    Axis, AxisType, RangeSelector as PlotlyRangeSelector, RangeSlider, SelectorButton,
    SelectorStep, StepMode,
};
use plotly::{Layout, Plot, Scatter};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SLIDER_BACKGROUND: &str = "#f8faaa";

/// 時系列 1 本の散布図
pub fn plot(desc: &ChartDescription) -> Plot {
    let (x, y): (Vec<String>, Vec<f64>) = desc
        .points()
        .iter()
        .map(|p| (p.time.format(TIME_FORMAT).to_string(), p.value))
        .unzip();

    let mut plot = Plot::new();
    plot.add_trace(Scatter::new(x, y));
    plot.set_layout(layout(desc));
    plot
}

fn layout(desc: &ChartDescription) -> Layout {
    let mut x_axis = Axis::new()
        .title(Title::with_text(desc.x_label()))
        .type_(AxisType::Date);
    if let Some(view) = desc.view() {
        x_axis = x_axis.range(vec![
            view.start.format(TIME_FORMAT).to_string(),
            view.end.format(TIME_FORMAT).to_string(),
        ]);
    }
    if let Some(selector) = desc.range_selector() {
        x_axis = x_axis.range_selector(range_selector(selector)).range_slider(
            RangeSlider::new()
                .visible(selector.slider)
                .background_color(SLIDER_BACKGROUND),
        );
    }
    Layout::new()
        .title(Title::with_text(desc.title()))
        .x_axis(x_axis)
        .y_axis(Axis::new().title(Title::with_text(desc.y_label())))
}

fn range_selector(selector: &RangeSelector) -> PlotlyRangeSelector {
    let buttons = selector
        .buttons
        .iter()
        .map(|button| match (button.step, button.count) {
            (Step::All, _) | (_, None) => SelectorButton::new()
                .label(&button.label)
                .step(SelectorStep::All),
            (step, Some(count)) => SelectorButton::new()
                .count(count as usize)
                .label(&button.label)
                .step(match step {
                    Step::Month => SelectorStep::Month,
                    _ => SelectorStep::Day,
                })
                .step_mode(StepMode::Backward),
        })
        .collect();
    PlotlyRangeSelector::new().buttons(buttons)
}

/// `<script>` 内に埋め込める JSON
///
/// `<` はすべて `\u003c` にするので、文字列中の `</script>` や `<!--` で
/// script 要素の解釈が変わらない。`Plot::to_inline_html` はこれをしない。
pub fn script_json(plot: &Plot) -> String {
    plot.to_json().replace('<', "\\u003c")
}

/// 図を描画する div と script
pub fn embed(div_id: &str, plot: &Plot) -> String {
    format!(
        r#"<div id="{div_id}"></div>
<script>
(function() {{
  var figure = {figure};
  Plotly.newPlot("{div_id}", figure);
}})();
</script>
"#,
        figure = script_json(plot),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use common::chart::{TimeRange, ValueAtTime};
    use serde_json::{Value, json};

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn desc(title: &str) -> ChartDescription {
        let t = base_time();
        let points = vec![
            ValueAtTime {
                time: t,
                value: 2.0,
            },
            ValueAtTime {
                time: t - Duration::minutes(1),
                value: 1.0,
            },
        ];
        ChartDescription::from_newest_first(title, title, points).unwrap()
    }

    fn figure(desc: &ChartDescription) -> Value {
        serde_json::from_str(&plot(desc).to_json()).unwrap()
    }

    #[test]
    fn test_figure_shape() {
        let fig = figure(&desc("temp"));
        assert_eq!(fig["data"][0]["type"], "scatter");
        assert_eq!(
            fig["data"][0]["x"],
            json!(["2024-03-01 11:59:00", "2024-03-01 12:00:00"])
        );
        assert_eq!(fig["data"][0]["y"], json!([1.0, 2.0]));
        assert_eq!(fig["layout"]["title"]["text"], "temp");
        assert_eq!(fig["layout"]["xaxis"]["type"], "date");
        assert!(fig["layout"]["xaxis"].get("rangeselector").is_none());
        assert!(fig["layout"]["xaxis"].get("range").is_none());
    }

    #[test]
    fn test_range_controls() {
        let end = base_time();
        let chart = desc("temp Values")
            .with_view(TimeRange::trailing(end, Duration::hours(24)))
            .with_range_selector(RangeSelector::default());
        let fig = figure(&chart);
        let xaxis = &fig["layout"]["xaxis"];

        assert_eq!(
            xaxis["range"],
            json!(["2024-02-29 12:00:00", "2024-03-01 12:00:00"])
        );
        assert_eq!(xaxis["rangeslider"]["visible"], true);
        assert_eq!(xaxis["rangeslider"]["bgcolor"], "#f8faaa");

        let buttons = xaxis["rangeselector"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 4);
        assert_eq!(buttons[0]["count"], 1);
        assert_eq!(buttons[0]["label"], "1d");
        assert_eq!(buttons[0]["step"], "day");
        assert_eq!(buttons[0]["stepmode"], "backward");
        assert_eq!(buttons[1]["count"], 7);
        assert_eq!(buttons[1]["step"], "day");
        assert_eq!(buttons[2]["step"], "month");
        assert_eq!(buttons[3]["label"], "all");
        assert_eq!(buttons[3]["step"], "all");
        assert!(buttons[3].get("count").is_none());
    }

    #[test]
    fn test_script_json_cannot_close_script() {
        let chart = desc("</script><script>alert(1)</script>");
        let embedded = embed("chart", &plot(&chart));
        assert_eq!(embedded.matches("</script>").count(), 1);
        assert!(embedded.contains(r#"\u003c/script>"#));

        // JSON としては元の文字列に戻る
        let start = embedded.find("var figure = ").unwrap() + "var figure = ".len();
        let end = embedded[start..].find(";\n").unwrap() + start;
        let parsed: Value = serde_json::from_str(&embedded[start..end]).unwrap();
        assert_eq!(parsed, figure(&chart));
    }
}
