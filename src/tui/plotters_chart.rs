//! Trend chart widget: Plotters line series drawn into a Ratatui buffer
//! through `plotters-ratatui-backend`.
//!
//! The x axis is "days since the first record of the window" so Plotters can
//! work on plain `f64` ranges; tick labels map back to calendar dates.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::Metric;

/// One metric's line: x is days since the chart origin.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLine {
    pub metric: Metric,
    pub points: Vec<(f64, f64)>,
}

/// Line colours of the original dashboard, tuned for dark terminals.
pub fn metric_rgb(metric: Metric) -> (u8, u8, u8) {
    match metric {
        Metric::Cases => (255, 165, 0),      // orange
        Metric::Deaths => (255, 0, 0),       // red
        Metric::Recovered => (0, 170, 0),    // green
        Metric::RecoveryRate => (0, 255, 0), // lime
        Metric::MortalityRate => (170, 0, 0), // dark red
    }
}

/// Same colour as a Ratatui style colour (legend text).
pub fn metric_color(metric: Metric) -> Color {
    let (r, g, b) = metric_rgb(metric);
    Color::Rgb(r, g, b)
}

/// One chart panel (counts or percentages). Lines and bounds are prepared by
/// the caller.
pub struct TrendChart<'a> {
    pub lines: &'a [ChartLine],
    /// X bounds (days since `x_origin`).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Date at x = 0.
    pub x_origin: NaiveDate,
    pub y_label: &'a str,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for TrendChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out axes in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let origin = self.x_origin;
        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 10)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc(self.y_label)
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| day_label(origin, *v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for line in self.lines {
                let (r, g, b) = metric_rgb(line.metric);
                let color = RGBColor(r, g, b);
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &color))?;
                // Pixels keep single-day windows visible.
                chart.draw_series(line.points.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// `YYYY-MM-DD` for an x offset (in days) from `origin`.
pub fn day_label(origin: NaiveDate, offset: f64) -> String {
    origin
        .checked_add_signed(Duration::days(offset.round() as i64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_labels_count_from_origin() {
        let origin = NaiveDate::from_ymd_opt(2021, 1, 30).unwrap();
        assert_eq!(day_label(origin, 0.0), "2021-01-30");
        assert_eq!(day_label(origin, 2.4), "2021-02-01");
    }
}
