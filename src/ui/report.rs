use eframe::egui::{RichText, Ui};

/// Findings written after inspecting the cleaned 2013–2017 Changping data.
const FINDINGS: [(&str, &str); 2] = [
    (
        "Seasonal trend of SO₂ and NO₂",
        "The quarterly means follow a yearly cycle: concentrations fall until \
         the third quarter of each year and rise sharply afterwards. External \
         factors such as weather and human activity are the likely drivers.",
    ),
    (
        "Correlation between temperature (TEMP) and O₃",
        "The heatmap shows a clearly positive correlation between O₃ and TEMP: \
         when the temperature rises, the O₃ concentration tends to rise as \
         well, and the other way round.",
    ),
];

/// Render the fixed conclusion section.
pub fn conclusion(ui: &mut Ui) {
    ui.heading("Conclusion");
    for (title, body) in FINDINGS {
        ui.horizontal_wrapped(|ui: &mut Ui| {
            ui.label(RichText::new(format!("• {title}:")).strong());
            ui.label(body);
        });
        ui.add_space(4.0);
    }
}
