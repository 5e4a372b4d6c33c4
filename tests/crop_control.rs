use eframe_photo_editor::config::EditorOptions;
use eframe_photo_editor::controls::crop::{CropBox, CropControl};
use eframe_photo_editor::controls::{Control, ControlContext};
use eframe_photo_editor::editor::Editor;
use eframe_photo_editor::modal::ModalManager;
use eframe_photo_editor::operation::CROP;
use eframe_photo_editor::sdk::PassthroughSdk;
use eframe_photo_editor::shared_state::{SharedState, SharedValues};
use egui::vec2;
use image::RgbaImage;

fn options() -> EditorOptions {
    EditorOptions::from_json(
        r#"{
            "controls_options": {
                "crop": {
                    "ratios": [
                        { "identifier": "free", "label": "Free" },
                        { "identifier": "square", "label": "Square", "ratio": 1.0 }
                    ]
                }
            }
        }"#,
    )
    .unwrap()
}

fn editor(options: &EditorOptions) -> Editor {
    let mut editor = Editor::new(Box::new(PassthroughSdk::new()), options);
    editor.set_canvas_dimensions(vec2(400.0, 400.0));
    editor.set_image(RgbaImage::new(200, 100)).unwrap();
    editor.tick();
    editor
}

#[test]
fn configured_ratios_replace_the_defaults() {
    let control = CropControl::new(&options());
    let identifiers: Vec<_> = control.ratios().iter().map(|r| r.identifier.as_str()).collect();
    assert_eq!(identifiers, ["free", "square"]);
}

#[test]
fn square_preset_centers_the_largest_square() {
    let options = options();
    let mut editor = editor(&options);
    let mut modals = ModalManager::new();
    let mut control = CropControl::new(&options);

    let shared = SharedState::new(control.initial_state(&mut editor, SharedValues::new()));
    assert_eq!(shared.get_string("ratio").as_deref(), Some("free"));

    let mut ctx = ControlContext {
        editor: &mut editor,
        shared: &shared,
        modals: &mut modals,
    };
    control.select_ratio(&mut ctx, "square");
    control.on_exit(&mut ctx);

    let crop = CropBox::from_operation(editor.operation(CROP).unwrap());
    assert!((crop.start.x - 0.25).abs() < 1e-4);
    assert!((crop.end.x - 0.75).abs() < 1e-4);
    assert_eq!(crop.start.y, 0.0);
    assert_eq!(crop.end.y, 1.0);
    let dimensions = editor.final_dimensions();
    assert!((dimensions.x - 100.0).abs() < 1e-2 && (dimensions.y - 100.0).abs() < 1e-2);
    assert_eq!(editor.history().len(), 1);
    assert_eq!(shared.get_string("ratio").as_deref(), Some("square"));
}
