use depsketch::graph_utils::document::GraphDocument;
use depsketch::gui::frontend::EditorApp;
use depsketch::persistence::persist;

use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    // A corrupt or unreadable autosave falls back to the demo document
    let loaded_state = match persist::load_active() {
        Ok(state) => state,
        Err(e) => {
            log::warn!("failed to read autosave: {e:#}");
            None
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1300.0, 710.0])
            // Provide sensible bounds so the UI stays usable on small screens
            .with_min_inner_size([700.0, 420.0])
            .with_resizable(true),
        ..Default::default()
    };
    eframe::run_native(
        "Dep-Sketch",
        options,
        Box::new(move |_cc| {
            let document = loaded_state.unwrap_or_else(GraphDocument::demo);
            Ok(Box::new(EditorApp::new(document)) as Box<dyn eframe::App>)
        }),
    )
}
