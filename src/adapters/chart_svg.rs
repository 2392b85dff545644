//! SVG rate charts: the full period, and one month with median and mean lines.

use crate::domain::analysis::MonthSummary;
use crate::domain::record::Record;
use chrono::NaiveDate;

const CHART_WIDTH: f64 = 900.0;
const CHART_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

struct Frame {
    min: f64,
    range: f64,
    count: usize,
}

impl Frame {
    fn new(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = if max - min > 0.0 { max - min } else { 1.0 };
        Self {
            min,
            range,
            count: values.len(),
        }
    }

    fn plot_width() -> f64 {
        CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height() -> f64 {
        CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, i: usize) -> f64 {
        MARGIN_LEFT + (i as f64 / (self.count.saturating_sub(1)).max(1) as f64) * Self::plot_width()
    }

    fn y(&self, v: f64) -> f64 {
        MARGIN_TOP + Self::plot_height() - ((v - self.min) / self.range) * Self::plot_height()
    }
}

fn open_svg(title: &str) -> String {
    let mut svg = String::new();
    svg.push_str(&format!(
        r##"<svg width="{}" height="{}" viewBox="0 0 {} {}" xmlns="http://www.w3.org/2000/svg">"##,
        CHART_WIDTH, CHART_HEIGHT, CHART_WIDTH, CHART_HEIGHT
    ));
    svg.push_str("\n  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"22\" text-anchor=\"middle\" font-size=\"16\" font-weight=\"bold\" fill=\"#222\">{}</text>\n",
        CHART_WIDTH / 2.0,
        title
    ));
    svg
}

fn axes(svg: &mut String, frame: &Frame, dates: &[NaiveDate]) {
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        MARGIN_TOP,
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke=\"#ccc\" stroke-width=\"1\"/>\n",
        MARGIN_LEFT,
        CHART_HEIGHT - MARGIN_BOTTOM,
        CHART_WIDTH - MARGIN_RIGHT,
        CHART_HEIGHT - MARGIN_BOTTOM
    ));
    for v in [frame.min, frame.min + frame.range / 2.0, frame.min + frame.range] {
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"10\" fill=\"#666\">{:.4}</text>\n",
            MARGIN_LEFT - 5.0,
            frame.y(v) + 3.0,
            v
        ));
    }
    if let (Some(first), Some(last)) = (dates.first(), dates.last()) {
        let mid = dates[dates.len() / 2];
        for (x, date) in [
            (MARGIN_LEFT, first),
            (MARGIN_LEFT + Frame::plot_width() / 2.0, &mid),
            (CHART_WIDTH - MARGIN_RIGHT, last),
        ] {
            svg.push_str(&format!(
                "  <text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"#666\">{}</text>\n",
                x,
                CHART_HEIGHT - 10.0,
                date
            ));
        }
    }
}

fn line_path(frame: &Frame, values: &[f64]) -> String {
    let mut path_data = String::new();
    for (i, &v) in values.iter().enumerate() {
        let cmd = if i == 0 { "M" } else { " L" };
        path_data.push_str(&format!("{} {:.1} {:.1}", cmd, frame.x(i), frame.y(v)));
    }
    path_data
}

fn hline(svg: &mut String, frame: &Frame, value: f64, color: &str, label: &str) {
    let y = frame.y(value);
    svg.push_str(&format!(
        "  <line x1=\"{}\" y1=\"{:.1}\" x2=\"{}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"2\" stroke-dasharray=\"6 4\"/>\n",
        MARGIN_LEFT,
        y,
        CHART_WIDTH - MARGIN_RIGHT,
        y,
        color
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"{:.1}\" text-anchor=\"end\" font-size=\"11\" fill=\"{}\">{}: {:.4}</text>\n",
        CHART_WIDTH - MARGIN_RIGHT - 4.0,
        y - 4.0,
        color,
        label,
        value
    ));
}

/// Line chart of every present rate. Empty string when there is nothing to draw.
pub fn render_rate_chart(records: &[Record]) -> String {
    let points: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.rate.map(|v| (r.date, v)))
        .collect();
    if points.is_empty() {
        return String::new();
    }

    let dates: Vec<NaiveDate> = points.iter().map(|(d, _)| *d).collect();
    let values: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let frame = Frame::new(&values);

    let mut svg = open_svg("INR/RUB exchange rate");
    axes(&mut svg, &frame, &dates);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"1\"/>\n",
        line_path(&frame, &values)
    ));
    svg.push_str("</svg>");
    svg
}

/// Daily rates of one month with dashed median and mean lines.
pub fn render_month_chart(summary: &MonthSummary) -> String {
    let dates: Vec<NaiveDate> = summary.points.iter().map(|(d, _)| *d).collect();
    let values: Vec<f64> = summary.points.iter().map(|(_, v)| *v).collect();
    let frame = Frame::new(&values);

    let mut svg = open_svg(&format!("INR/RUB rate, {}", summary.year_month));
    axes(&mut svg, &frame, &dates);
    svg.push_str(&format!(
        "  <path d=\"{}\" fill=\"none\" stroke=\"#2563eb\" stroke-width=\"2\"/>\n",
        line_path(&frame, &values)
    ));
    for (i, &v) in values.iter().enumerate() {
        svg.push_str(&format!(
            "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"3\" fill=\"#2563eb\"/>\n",
            frame.x(i),
            frame.y(v)
        ));
    }
    hline(&mut svg, &frame, summary.median, "#dc2626", "Median");
    hline(&mut svg, &frame, summary.mean, "#16a34a", "Mean");
    svg.push_str("</svg>");
    svg
}
