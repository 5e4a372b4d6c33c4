use eframe_photo_editor::config::EditorOptions;
use eframe_photo_editor::controls::crop::CropBox;
use eframe_photo_editor::controls::{ControlSwitcher, ControlTarget};
use eframe_photo_editor::editor::{Editor, Feature};
use eframe_photo_editor::modal::{ModalManager, ModalService};
use eframe_photo_editor::operation::{CROP, FILTER, ORIENTATION};
use eframe_photo_editor::sdk::PassthroughSdk;
use eframe_photo_editor::shared_state::SharedValues;
use egui::vec2;
use image::RgbaImage;

struct Fixture {
    editor: Editor,
    switcher: ControlSwitcher,
    modals: ModalManager,
}

impl Fixture {
    fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    fn with_options(options: EditorOptions) -> Self {
        let mut editor = Editor::new(Box::new(PassthroughSdk::new()), &options);
        editor.set_canvas_dimensions(vec2(400.0, 400.0));
        editor.set_image(RgbaImage::new(200, 100)).unwrap();
        editor.tick();
        Self {
            editor,
            switcher: ControlSwitcher::new(&options),
            modals: ModalManager::new(),
        }
    }

    fn switch(&mut self, target: ControlTarget) {
        self.switcher
            .switch(target, &mut self.editor, &mut self.modals, SharedValues::new());
    }

    fn open(&mut self, identifier: &str) {
        self.switch(ControlTarget::Control(identifier.to_owned()));
    }
}

#[test]
fn back_returns_through_the_stack() {
    let mut fixture = Fixture::new();
    assert!(fixture.switcher.is_home());

    fixture.open("crop");
    fixture.open("orientation");
    assert_eq!(fixture.switcher.current_identifier(), Some("orientation"));
    assert_eq!(fixture.switcher.back_stack(), &[None, Some("crop")]);

    fixture.switch(ControlTarget::Back);
    assert_eq!(fixture.switcher.current_identifier(), Some("crop"));

    fixture.switch(ControlTarget::Back);
    assert!(fixture.switcher.is_home());
    assert!(fixture.switcher.back_stack().is_empty());
}

#[test]
fn home_clears_the_stack() {
    let mut fixture = Fixture::new();
    fixture.open("filters");
    fixture.open("adjustments");

    fixture.switch(ControlTarget::Home);
    assert!(fixture.switcher.is_home());
    assert!(fixture.switcher.back_stack().is_empty());
}

#[test]
fn unknown_controls_are_ignored() {
    let mut fixture = Fixture::new();
    fixture.open("crop");
    fixture.open("lasso");
    assert_eq!(fixture.switcher.current_identifier(), Some("crop"));
    assert_eq!(fixture.switcher.back_stack(), &[None]);
}

#[test]
fn controls_for_unconfigured_operations_do_not_open() {
    let options = EditorOptions {
        operations_order: vec![CROP.to_owned(), FILTER.to_owned()],
        ..Default::default()
    };
    let mut fixture = Fixture::with_options(options);
    fixture.open("orientation");
    assert!(fixture.switcher.current_identifier().is_none());
}

#[test]
fn crop_suspends_canvas_features_until_exit() {
    let mut fixture = Fixture::new();
    fixture.open("crop");
    assert!(!fixture.editor.is_feature_enabled(Feature::Zoom));
    assert!(!fixture.editor.is_feature_enabled(Feature::Drag));
    assert!(!fixture.editor.operation(CROP).unwrap().is_enabled());

    fixture.switch(ControlTarget::Home);
    assert!(fixture.editor.is_feature_enabled(Feature::Zoom));
    assert!(fixture.editor.is_feature_enabled(Feature::Drag));
}

#[test]
fn untouched_crop_leaves_no_trace() {
    let mut fixture = Fixture::new();
    fixture.open("crop");
    fixture.switch(ControlTarget::Home);

    assert!(fixture.editor.operation(CROP).is_none());
    assert!(!fixture.editor.can_undo());
}

#[test]
fn edited_crop_commits_history_on_exit() {
    let mut fixture = Fixture::new();
    fixture.open("crop");
    let cropped = CropBox {
        start: vec2(0.1, 0.1),
        end: vec2(0.9, 0.9),
    };
    fixture
        .editor
        .set_operation_options(CROP, cropped.to_options())
        .unwrap();

    fixture.switch(ControlTarget::Home);
    let crop = fixture.editor.operation(CROP).unwrap();
    assert!(crop.is_enabled());
    assert_eq!(CropBox::from_operation(crop), cropped);
    assert_eq!(fixture.editor.history().len(), 1);

    assert!(fixture.editor.undo().unwrap());
    assert!(fixture.editor.operation(CROP).is_none());
}

#[test]
fn leaving_a_control_disposes_its_shared_state() {
    let mut fixture = Fixture::new();
    fixture.open("orientation");
    let shared = fixture.switcher.shared().clone();
    assert_eq!(shared.get_bool("orientation.existed_before"), Some(false));
    assert!(!shared.is_disposed());

    fixture.switch(ControlTarget::Back);
    assert!(shared.is_disposed());
    assert!(fixture.editor.operation(ORIENTATION).is_none());
}

#[test]
fn opening_a_control_does_not_touch_the_modal_queue() {
    let mut fixture = Fixture::new();
    fixture.open("filters");
    fixture.switch(ControlTarget::Home);
    assert!(fixture.modals.is_empty());
}

#[test]
fn unavailable_control_leaves_the_active_one_open() {
    let options = EditorOptions {
        operations_order: vec![CROP.to_owned()],
        ..Default::default()
    };
    let mut fixture = Fixture::with_options(options);
    fixture.open("crop");
    fixture.open("filters");

    assert_eq!(fixture.switcher.current_identifier(), Some("crop"));
    assert_eq!(fixture.switcher.back_stack(), &[None]);
    assert!(!fixture.switcher.shared().is_disposed());
    // on_exit did not run: the crop is still suspended and nothing was committed.
    assert!(!fixture.editor.operation(CROP).unwrap().is_enabled());
    assert!(!fixture.editor.is_feature_enabled(Feature::Zoom));
    assert!(!fixture.editor.can_undo());
}
