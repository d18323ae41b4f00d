use std::collections::BTreeMap;

use eframe::egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui, Vec2};
use egui_plot::{
    BoxElem, BoxPlot, BoxSpread, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points,
};

use crate::color::{DivergingMap, trend_colors};
use crate::data::aggregate::{CorrelationMatrix, QuarterlySeries};
use crate::data::stats::BoxSummary;

const BOX_COLOR: Color32 = Color32::from_rgb(76, 114, 176);

// ---------------------------------------------------------------------------
// Boxplots (before / after imputation)
// ---------------------------------------------------------------------------

/// Render one boxplot per column in a two-column grid.
pub fn boxplot_grid(
    ui: &mut Ui,
    title: &str,
    id_prefix: &str,
    columns: &[String],
    boxes: &BTreeMap<String, BoxSummary>,
) {
    ui.heading(title);

    let shown: Vec<(&String, &BoxSummary)> = columns
        .iter()
        .filter_map(|name| boxes.get(name).map(|b| (name, b)))
        .collect();
    for pair in shown.chunks(2) {
        ui.columns(2, |cols| {
            for (col_ui, (name, summary)) in cols.iter_mut().zip(pair) {
                single_boxplot(col_ui, &format!("{id_prefix}_{name}"), name, summary);
            }
        });
    }
    ui.add_space(12.0);
}

fn single_boxplot(ui: &mut Ui, id: &str, name: &str, summary: &BoxSummary) {
    ui.label(format!("Boxplot of {name}"));

    let elem = BoxElem::new(
        0.0,
        BoxSpread::new(
            summary.lower_whisker,
            summary.q1,
            summary.median,
            summary.q3,
            summary.upper_whisker,
        ),
    )
    .name(name)
    .box_width(0.5)
    .whisker_width(0.25)
    .fill(BOX_COLOR.gamma_multiply(0.6))
    .stroke(Stroke::new(1.5, BOX_COLOR));

    let fliers: Vec<[f64; 2]> = summary.fliers.iter().map(|&v| [0.0, v]).collect();

    Plot::new(id)
        .height(220.0)
        .show_x(false)
        .show_axes([false, true])
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .include_x(-0.6)
        .include_x(0.6)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(name));
            if !fliers.is_empty() {
                plot_ui.points(
                    Points::new(fliers)
                        .shape(MarkerShape::Diamond)
                        .radius(2.5)
                        .color(Color32::DARK_GRAY)
                        .name("outliers"),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Seasonal trend (quarterly means)
// ---------------------------------------------------------------------------

/// Quarterly mean concentration per pollutant, one line each.
pub fn seasonal_trend(ui: &mut Ui, series: &QuarterlySeries) {
    let names: Vec<&str> = series.means.iter().map(|(name, _)| name.as_str()).collect();
    ui.heading(format!("Quarterly trend of {}", names.join(" and ")));

    if series.quarters.is_empty() {
        ui.label("No dated rows to aggregate.");
        return;
    }

    let labels = series.labels();
    let colors = trend_colors(series.means.len());
    let styles = [
        (LineStyle::Solid, MarkerShape::Circle),
        (LineStyle::dashed_loose(), MarkerShape::Square),
    ];

    Plot::new("seasonal_trend")
        .height(320.0)
        .legend(Legend::default())
        .x_axis_label("Quarter")
        .y_axis_label("Concentration (µg/m³)")
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (pollutant, means)) in series.means.iter().enumerate() {
                let points: Vec<[f64; 2]> = means
                    .iter()
                    .enumerate()
                    .filter_map(|(x, m)| m.map(|y| [x as f64, y]))
                    .collect();
                let (style, marker) = styles[i % styles.len()];
                let color = colors[i];

                plot_ui.line(
                    Line::new(PlotPoints::from(points.clone()))
                        .name(pollutant)
                        .color(color)
                        .style(style)
                        .width(2.0),
                );
                plot_ui.points(
                    Points::new(points)
                        .name(pollutant)
                        .color(color)
                        .shape(marker)
                        .radius(4.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

const CELL: f32 = 110.0;
const LABEL_MARGIN: f32 = 60.0;

/// Annotated heatmap of a correlation matrix.
pub fn correlation_heatmap(ui: &mut Ui, matrix: &CorrelationMatrix) {
    ui.heading(format!("Correlation between {}", matrix.columns.join(" and ")));

    let n = matrix.columns.len();
    let size = Vec2::new(LABEL_MARGIN + n as f32 * CELL, n as f32 * CELL + LABEL_MARGIN / 2.0);
    let (response, painter) = ui.allocate_painter(size, Sense::hover());
    let origin = response.rect.min + Vec2::new(LABEL_MARGIN, 0.0);

    let map = DivergingMap::default();
    let text_font = FontId::proportional(16.0);
    let label_font = FontId::proportional(13.0);
    let label_color = ui.visuals().text_color();

    for row in 0..n {
        for col in 0..n {
            let value = matrix.get(row, col);
            let min = origin + Vec2::new(col as f32 * CELL, row as f32 * CELL);
            let rect = Rect::from_min_size(min, Vec2::splat(CELL));
            let fill = map.color_for(value);
            painter.rect_filled(rect.shrink(1.0), 0.0, fill);

            let text = if value.is_nan() {
                "n/a".to_string()
            } else {
                format!("{value:.2}")
            };
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                text,
                text_font.clone(),
                DivergingMap::text_color_on(fill),
            );
        }
    }

    for (i, name) in matrix.columns.iter().enumerate() {
        let y = origin.y + (i as f32 + 0.5) * CELL;
        painter.text(
            Pos2::new(origin.x - 8.0, y),
            Align2::RIGHT_CENTER,
            name,
            label_font.clone(),
            label_color,
        );
        let x = origin.x + (i as f32 + 0.5) * CELL;
        painter.text(
            Pos2::new(x, origin.y + n as f32 * CELL + 6.0),
            Align2::CENTER_TOP,
            name,
            label_font.clone(),
            label_color,
        );
    }

    response.on_hover_text("Pearson correlation after outlier imputation");
}
