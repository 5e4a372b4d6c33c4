use eframe_photo_editor::config::EditorOptions;
use eframe_photo_editor::controls::crop::CropBox;
use eframe_photo_editor::controls::focus::{FocusControl, FocusMode};
use eframe_photo_editor::controls::orientation::OrientationControl;
use eframe_photo_editor::controls::{Control, ControlContext};
use eframe_photo_editor::editor::Editor;
use eframe_photo_editor::modal::ModalManager;
use eframe_photo_editor::operation::{CROP, ORIENTATION, RADIAL_BLUR, TILT_SHIFT};
use eframe_photo_editor::sdk::PassthroughSdk;
use eframe_photo_editor::shared_state::{SharedState, SharedValues};
use egui::vec2;
use image::RgbaImage;

fn editor() -> Editor {
    let mut editor = Editor::new(Box::new(PassthroughSdk::new()), &EditorOptions::default());
    editor.set_canvas_dimensions(vec2(400.0, 400.0));
    editor.set_image(RgbaImage::new(200, 100)).unwrap();
    editor.tick();
    editor
}

#[test]
fn one_rotation_session_undoes_in_one_step() {
    let mut editor = editor();
    let left_half = CropBox {
        start: vec2(0.0, 0.0),
        end: vec2(0.5, 1.0),
    };
    editor.set_operation_options(CROP, left_half.to_options()).unwrap();

    let mut modals = ModalManager::new();
    let mut control = OrientationControl::new();
    let shared = SharedState::new(control.initial_state(&mut editor, SharedValues::new()));
    let mut ctx = ControlContext {
        editor: &mut editor,
        shared: &shared,
        modals: &mut modals,
    };
    control.rotate(&mut ctx, true);
    control.on_exit(&mut ctx);

    assert_ne!(CropBox::from_operation(editor.operation(CROP).unwrap()), left_half);
    assert_eq!(editor.history().len(), 1);

    assert!(editor.undo().unwrap());
    assert!(editor.operation(ORIENTATION).is_none());
    assert_eq!(CropBox::from_operation(editor.operation(CROP).unwrap()), left_half);
    assert!(!editor.can_undo());
}

#[test]
fn focus_mode_switch_undoes_in_one_step() {
    let mut editor = editor();
    let mut modals = ModalManager::new();
    let mut control = FocusControl::new();

    let shared = SharedState::new(control.initial_state(&mut editor, SharedValues::new()));
    let mut ctx = ControlContext {
        editor: &mut editor,
        shared: &shared,
        modals: &mut modals,
    };
    control.select_mode(&mut ctx, FocusMode::Radial);
    control.on_exit(&mut ctx);

    let shared = SharedState::new(control.initial_state(&mut editor, SharedValues::new()));
    let mut ctx = ControlContext {
        editor: &mut editor,
        shared: &shared,
        modals: &mut modals,
    };
    control.select_mode(&mut ctx, FocusMode::Linear);
    control.on_exit(&mut ctx);

    assert!(editor.operation(RADIAL_BLUR).is_none());
    assert!(editor.operation(TILT_SHIFT).is_some());
    assert_eq!(editor.history().len(), 2);

    assert!(editor.undo().unwrap());
    assert!(editor.operation(RADIAL_BLUR).is_some());
    assert!(editor.operation(TILT_SHIFT).is_none());
}
