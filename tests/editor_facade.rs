use std::cell::RefCell;
use std::rc::Rc;

use eframe_photo_editor::config::EditorOptions;
use eframe_photo_editor::editor::{Editor, Zoom};
use eframe_photo_editor::error::EditorError;
use eframe_photo_editor::event::EditorEvent;
use eframe_photo_editor::operation::{
    ADJUSTMENTS, CROP, FILTER, OperationOptions, OperationStack, WATERMARK, options,
};
use eframe_photo_editor::sdk::{PassthroughSdk, Sdk, SdkError};
use egui::{Vec2, vec2};
use image::RgbaImage;
use serde_json::json;

/// Wraps the passthrough engine and fails renders or exports on demand
#[derive(Default)]
struct FlakySdk {
    inner: PassthroughSdk,
    fail_render: bool,
    fail_export: bool,
}

impl Sdk for FlakySdk {
    fn set_image(&mut self, image: RgbaImage) {
        self.inner.set_image(image);
    }
    fn image_dimensions(&self) -> Option<[u32; 2]> {
        self.inner.image_dimensions()
    }
    fn max_dimensions(&self) -> Option<[u32; 2]> {
        self.inner.max_dimensions()
    }
    fn final_dimensions(&self, operations: &OperationStack) -> Vec2 {
        self.inner.final_dimensions(operations)
    }
    fn set_zoom(&mut self, zoom: f32) {
        self.inner.set_zoom(zoom);
    }
    fn zoom(&self) -> f32 {
        self.inner.zoom()
    }
    fn set_offset(&mut self, offset: Vec2) {
        self.inner.set_offset(offset);
    }
    fn offset(&self) -> Vec2 {
        self.inner.offset()
    }
    fn render(&mut self, operations: &mut OperationStack) -> Result<(), SdkError> {
        if self.fail_render {
            return Err(SdkError::RenderFailed("out of memory".to_owned()));
        }
        self.inner.render(operations)
    }
    fn export(&mut self, operations: &mut OperationStack) -> Result<RgbaImage, SdkError> {
        if self.fail_export {
            return Err(SdkError::ExportFailed("encoder crashed".to_owned()));
        }
        self.inner.export(operations)
    }
    fn preview(&self) -> Option<(&RgbaImage, u64)> {
        self.inner.preview()
    }
    fn reset(&mut self) {
        self.inner.reset();
    }
}

fn editor_with(options: &EditorOptions, sdk: Box<dyn Sdk>, width: u32, height: u32) -> Editor {
    let mut editor = Editor::new(sdk, options);
    editor.set_canvas_dimensions(vec2(500.0, 500.0));
    editor.set_image(RgbaImage::new(width, height)).unwrap();
    editor.tick();
    editor
}

fn editor(width: u32, height: u32) -> Editor {
    editor_with(&EditorOptions::default(), Box::new(PassthroughSdk::new()), width, height)
}

fn recorded(editor: &Editor) -> Rc<RefCell<Vec<EditorEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    editor.subscribe(Box::new(move |event: &EditorEvent| sink.borrow_mut().push(event.clone())));
    events
}

#[test]
fn zoom_is_clamped_and_auto_fits() {
    let mut editor = editor(1000, 500);
    assert_eq!(editor.default_zoom(), 0.5);
    assert_eq!(editor.min_zoom(), 0.3);
    assert_eq!(editor.max_zoom(), 1.0);

    assert_eq!(editor.set_zoom(Zoom::Value(10.0), None), 1.0);
    assert_eq!(editor.set_zoom(Zoom::Value(0.01), None), 0.3);
    assert_eq!(editor.set_zoom(Zoom::Auto, None), editor.default_zoom());
}

#[test]
fn undo_zoom_restores_once() {
    let mut editor = editor(1000, 500);
    editor.set_zoom(Zoom::Value(0.8), None);
    editor.set_zoom(Zoom::Value(0.4), None);

    assert_eq!(editor.undo_zoom(), Some(0.8));
    assert_eq!(editor.zoom(), 0.8);
    assert_eq!(editor.undo_zoom(), None);
    assert_eq!(editor.zoom(), 0.8);
}

#[test]
fn offset_is_pinned_while_the_output_fits() {
    let mut editor = editor(1000, 500);
    editor.set_zoom(Zoom::Auto, None);
    assert_eq!(editor.set_offset(vec2(40.0, 40.0)), Vec2::ZERO);

    // 1000x500 at zoom 1 overflows the 500x500 canvas by 250 on each side horizontally.
    editor.set_zoom(Zoom::Value(1.0), None);
    assert_eq!(editor.set_offset(vec2(400.0, 40.0)), vec2(250.0, 0.0));
}

#[test]
fn get_or_create_is_idempotent_until_removed() {
    let mut editor = editor(100, 100);
    editor
        .get_or_create_operation(FILTER, options([("filter", json!("sepia"))]))
        .unwrap();
    let again = editor
        .get_or_create_operation(FILTER, options([("filter", json!("identity"))]))
        .unwrap();
    assert_eq!(again.option_str("filter"), Some("sepia"));

    editor.remove_operation(FILTER);
    let fresh = editor
        .get_or_create_operation(FILTER, options([("filter", json!("identity"))]))
        .unwrap();
    assert_eq!(fresh.option_str("filter"), Some("identity"));

    editor.reset();
    assert!(editor.operation(FILTER).is_none());
}

#[test]
fn removing_an_operation_dirties_only_later_ones() {
    let mut editor = editor(100, 100);
    for identifier in [CROP, FILTER, ADJUSTMENTS] {
        editor
            .get_or_create_operation(identifier, OperationOptions::new())
            .unwrap();
    }
    editor.tick();
    assert!(editor.operations().iter().all(|operation| !operation.is_dirty()));

    editor.remove_operation(FILTER);
    assert!(!editor.operation(CROP).unwrap().is_dirty());
    assert!(editor.operation(ADJUSTMENTS).unwrap().is_dirty());
}

#[test]
fn undo_removes_new_operations_and_restores_existing_ones() {
    let mut editor = editor(100, 100);

    editor
        .set_operation_options(FILTER, options([("filter", json!("sepia"))]))
        .unwrap();
    editor.add_history(FILTER, OperationOptions::new(), false);
    assert!(editor.undo().unwrap());
    assert!(editor.operation(FILTER).is_none());

    editor
        .set_operation_options(FILTER, options([("filter", json!("sepia"))]))
        .unwrap();
    let prior = editor.operation(FILTER).unwrap().serialize_options();
    editor
        .set_operation_options(FILTER, options([("filter", json!("noir"))]))
        .unwrap();
    editor.add_history(FILTER, prior, true);
    assert!(editor.undo().unwrap());
    assert_eq!(editor.operation(FILTER).unwrap().option_str("filter"), Some("sepia"));

    assert!(!editor.undo().unwrap());
}

#[test]
fn export_restores_watermark_after_success() {
    let mut editor = editor(64, 48);
    editor
        .get_or_create_operation(WATERMARK, OperationOptions::new())
        .unwrap();

    editor.export(false).unwrap();
    assert!(editor.operation(WATERMARK).unwrap().is_enabled());
}

#[test]
fn export_restores_watermark_after_failure() {
    let sdk = FlakySdk {
        fail_export: true,
        ..Default::default()
    };
    let mut editor = editor_with(&EditorOptions::default(), Box::new(sdk), 64, 48);
    let events = recorded(&editor);
    editor
        .get_or_create_operation(WATERMARK, OperationOptions::new())
        .unwrap();

    assert!(matches!(editor.export(false), Err(EditorError::Export(_))));
    assert!(editor.operation(WATERMARK).unwrap().is_enabled());
    assert!(
        events
            .borrow()
            .iter()
            .any(|event| matches!(event, EditorEvent::ExportFailed(_)))
    );
}

#[test]
fn oversized_images_are_downsampled_to_the_cap() {
    let editor = editor(4000, 3000);
    let [width, height] = editor.sdk().image_dimensions().unwrap();
    assert!(u64::from(width) * u64::from(height) <= 10_000_000);
    let ratio = width as f32 / height as f32;
    assert!((ratio - 4.0 / 3.0).abs() < 0.01);
}

#[test]
fn resize_is_announced_before_ready() {
    let mut editor = Editor::new(Box::new(PassthroughSdk::new()), &EditorOptions::default());
    let events = recorded(&editor);
    assert!(editor.needs_resize([4000, 3000]));
    editor.set_image(RgbaImage::new(4000, 3000)).unwrap();

    let events = events.borrow();
    let resize = events.iter().position(|e| matches!(e, EditorEvent::Resize { .. }));
    let ready = events.iter().position(|e| *e == EditorEvent::Ready);
    assert!(resize.unwrap() < ready.unwrap());
}

#[test]
fn unknown_operations_are_rejected() {
    let options = EditorOptions {
        operations_order: vec![CROP.to_owned(), FILTER.to_owned()],
        ..Default::default()
    };
    let mut editor = editor_with(&options, Box::new(PassthroughSdk::new()), 10, 10);
    let result = editor.get_or_create_operation("sticker", OperationOptions::new());
    assert!(matches!(result, Err(EditorError::UnknownOperation(id)) if id == "sticker"));
}

#[test]
fn renders_coalesce_and_callbacks_run_in_order() {
    let mut editor = editor(10, 10);
    let order = Rc::new(RefCell::new(Vec::new()));
    for index in 0..3 {
        let order = Rc::clone(&order);
        editor.render(Some(Box::new(move || order.borrow_mut().push(index))));
    }

    assert!(editor.tick());
    assert!(!editor.tick());
    assert_eq!(*order.borrow(), vec![0, 1, 2]);
}

#[test]
fn render_errors_are_broadcast_and_callbacks_still_run() {
    let sdk = FlakySdk {
        fail_render: true,
        ..Default::default()
    };
    let mut editor = Editor::new(Box::new(sdk), &EditorOptions::default());
    let events = recorded(&editor);
    editor.set_image(RgbaImage::new(8, 8)).unwrap();

    let called = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&called);
    editor.render(Some(Box::new(move || *flag.borrow_mut() = true)));
    editor.tick();

    assert!(*called.borrow());
    assert!(
        events
            .borrow()
            .iter()
            .any(|event| matches!(event, EditorEvent::RenderError(_)))
    );
}

#[test]
fn render_future_resolves_after_tick() {
    let mut editor = editor(10, 10);
    let mut receiver = editor.render_future();
    assert_eq!(receiver.try_recv(), Ok(None));
    editor.tick();
    assert_eq!(receiver.try_recv(), Ok(Some(())));
}
