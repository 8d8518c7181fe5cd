use eframe::egui::{self, Color32, RichText, Ui};

use crate::config::DatasetYear;
use crate::data::filter::PropertyType;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – selection widgets
// ---------------------------------------------------------------------------

/// Render the left selection panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Sidebar");
    ui.separator();

    ui.strong("Select Data Files");
    let mut year = state.year;
    for option in DatasetYear::ALL {
        ui.radio_value(&mut year, option, option.to_string());
    }
    ui.add_space(8.0);

    ui.strong("Select Any Values:");
    let mut property_type = state.property_type;
    for option in PropertyType::ALL {
        ui.radio_value(&mut property_type, option, option.label());
    }

    // Apply after the widgets so a click rebuilds the view only once.
    state.select_year(year);
    state.select_property_type(property_type);

    ui.add_space(8.0);
    ui.separator();
    ui.small(format!("Dataset: {}", state.current_path().display()));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Choose dataset folder…").clicked() {
                choose_dataset_dir(state);
                ui.close_menu();
            }
            if ui.button("Reload year").clicked() {
                state.reload();
                ui.close_menu();
            }
            if ui.button("Export charts…").clicked() {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} transactions in {}, {} of type {}",
            state.view.total_rows, state.view.year, state.view.selected_rows, state.view.property_type
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn choose_dataset_dir(state: &mut AppState) {
    let dir = rfd::FileDialog::new()
        .set_title("Folder with full_<year> files")
        .set_directory(&state.config.dataset_dir)
        .pick_folder();

    if let Some(dir) = dir {
        state.set_dataset_dir(dir);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export charts")
        .add_filter("JSON", &["json"])
        .set_file_name(format!(
            "charts_{}_{}.json",
            state.view.year.year(),
            state.view.property_type.label().to_lowercase().replace([' ', '.'], "_")
        ))
        .save_file();

    if let Some(path) = file {
        if let Err(e) = state.export_view(&path) {
            log::error!("Failed to export charts: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
