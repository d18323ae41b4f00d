use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::imputer::ImputationReport;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – chart toggles and cleaning summary
// ---------------------------------------------------------------------------

/// Render the left control panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Details");
    ui.separator();

    ui.label("Tick to inspect the Changping data in more detail.");
    ui.checkbox(&mut state.show_before, "Show boxplots before imputation");
    ui.checkbox(&mut state.show_after, "Show boxplots after imputation");
    ui.separator();

    let Some(analysis) = &state.analysis else {
        ui.label("No dataset loaded.");
        return;
    };

    ui.strong("Outlier imputation");
    ui.add_space(4.0);
    imputation_table(ui, &analysis.reports);
    ui.add_space(4.0);
    ui.label(format!(
        "{} rows loaded, {} dropped for missing values, {} kept",
        analysis.rows_loaded,
        analysis.dropped_rows,
        analysis.cleaned.len()
    ));
}

fn imputation_table(ui: &mut Ui, reports: &[ImputationReport]) {
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            for title in ["Column", "Passes", "Replaced", "Final bounds"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for report in reports {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(report.column.as_str());
                    });
                    row.col(|ui| {
                        ui.label(report.passes.to_string());
                    });
                    row.col(|ui| {
                        ui.label(report.replaced.to_string());
                    });
                    row.col(|ui| {
                        let text = report.bounds.map_or_else(
                            || "–".to_string(),
                            |b| format!("[{:.1}, {:.1}]", b.lower, b.upper),
                        );
                        ui.label(text);
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(path), Some(raw)) = (&state.source, &state.raw) {
            ui.label(format!("{}: {} rows", path.display(), raw.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air-quality data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
