use axum::response::Html;
use chrono::NaiveDateTime;

pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const PLOTLY_SCRIPT: &str = r#"<script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>"#;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// `title` はエスケープ済みでなくてよい、`body` はエスケープ済みの HTML
pub fn page(title: &str, body: &str) -> Html<String> {
    render(title, "", body)
}

/// Plotly を読み込むページ
pub fn chart_page(title: &str, body: &str) -> Html<String> {
    render(title, PLOTLY_SCRIPT, body)
}

fn render(title: &str, head: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
{head}
</head>
<body>
<nav><a href="/">Sensors</a></nav>
{body}
</body>
</html>
"#,
        title = escape(title),
    ))
}

pub fn sensor_links(id: i32) -> String {
    format!(
        r#"<a href="/sens/{id}">detail</a> <a href="/meas/{id}">measurements</a> <a href="/plot/{id}">plot</a> <a href="/new_plot/{id}">last day</a> <a href="/range_plot/{id}">history</a>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape("温度"), "温度");
    }

    #[test]
    fn test_page_escapes_title() {
        let Html(body) = page("<script>", "<p>ok</p>");
        assert!(body.contains("<title>&lt;script&gt;</title>"));
        assert!(body.contains("<p>ok</p>"));
        assert!(!body.contains("plotly"));
    }

    #[test]
    fn test_chart_page_loads_plotly() {
        let Html(body) = chart_page("t", "");
        assert!(body.contains("cdn.plot.ly"));
    }
}
