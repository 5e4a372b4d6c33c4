use crate::config::EditorOptions;
use crate::editor::Editor;
use crate::modal::ModalService;
use crate::shared_state::{SharedState, SharedValues};

use super::{Control, ControlContext, ControlTarget, ControlsRegistry};

/// Tracks the active control, its shared state and the back stack.
///
/// `None` on the back stack stands for the overview.
pub struct ControlSwitcher {
    registry: ControlsRegistry,
    options: EditorOptions,
    back_stack: Vec<Option<&'static str>>,
    current: Option<Box<dyn Control>>,
    shared: SharedState,
    repaint: Option<egui::Context>,
}

impl std::fmt::Debug for ControlSwitcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlSwitcher")
            .field("back_stack", &self.back_stack)
            .field("current", &self.current_identifier())
            .field("shared", &self.shared)
            .finish()
    }
}

impl ControlSwitcher {
    pub fn new(options: &EditorOptions) -> Self {
        Self {
            registry: ControlsRegistry::new(options),
            options: options.clone(),
            back_stack: Vec::new(),
            current: None,
            shared: SharedState::default(),
            repaint: None,
        }
    }

    /// Every shared-state change of later activations requests a repaint of `ctx`
    pub fn set_repaint_context(&mut self, ctx: egui::Context) {
        self.repaint = Some(ctx);
    }

    pub fn registry(&self) -> &ControlsRegistry {
        &self.registry
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn current_identifier(&self) -> Option<&'static str> {
        self.current.as_ref().map(|control| control.identifier())
    }

    pub fn back_stack(&self) -> &[Option<&'static str>] {
        &self.back_stack
    }

    pub fn shared(&self) -> &SharedState {
        &self.shared
    }

    pub fn is_home(&self) -> bool {
        self.current.is_none()
    }

    /// Switches to `target`.
    ///
    /// The incoming control is built and checked first; an unknown or unavailable target
    /// leaves the active control, its shared state and the back stack untouched. Otherwise
    /// the outgoing control's `on_exit` runs while its shared state is still live, that state
    /// is disposed, and a fresh one is built from the incoming control's `initial_state`
    /// merged with `extra`.
    pub fn switch(
        &mut self,
        target: ControlTarget,
        editor: &mut Editor,
        modals: &mut dyn ModalService,
        extra: SharedValues,
    ) {
        let next = match &target {
            ControlTarget::Home => None,
            ControlTarget::Back => self.back_stack.last().copied().flatten(),
            ControlTarget::Control(identifier) => match self.registry.get(identifier) {
                Some(descriptor) => Some(descriptor.identifier),
                None => {
                    log::warn!("cannot switch to unknown control `{}`", identifier);
                    return;
                }
            },
        };

        let incoming = match next.and_then(|identifier| self.registry.get(identifier).copied()) {
            Some(descriptor) => {
                let control = descriptor.create(&self.options);
                if !control.is_available(editor) {
                    log::warn!("control `{}` is not available for this editor", descriptor.identifier);
                    return;
                }
                Some(control)
            }
            None => None,
        };

        let previous = self.current_identifier();
        match target {
            ControlTarget::Home => self.back_stack.clear(),
            ControlTarget::Back => {
                self.back_stack.pop();
            }
            ControlTarget::Control(_) => self.back_stack.push(previous),
        }

        self.exit_current(editor, modals);

        let Some(mut control) = incoming else {
            log::debug!("switched to overview");
            return;
        };
        let values = control.initial_state(editor, extra);
        self.shared = SharedState::new(values);
        if let Some(ctx) = self.repaint.clone() {
            self.shared.subscribe(move |_| ctx.request_repaint());
        }
        log::debug!("switched to control `{}`", control.identifier());
        self.current = Some(control);
    }

    /// Ends the active control without opening another one
    pub fn exit_current(&mut self, editor: &mut Editor, modals: &mut dyn ModalService) {
        if let Some(mut control) = self.current.take() {
            let shared = self.shared.clone();
            let mut ctx = ControlContext {
                editor,
                shared: &shared,
                modals,
            };
            control.on_exit(&mut ctx);
        }
        self.shared.dispose();
        self.shared = SharedState::default();
    }

    /// Runs the active control's lower panel and applies any switch it requests
    pub fn panel_ui(&mut self, ui: &mut egui::Ui, editor: &mut Editor, modals: &mut dyn ModalService) {
        let Some(control) = self.current.as_mut() else {
            return;
        };
        let shared = self.shared.clone();
        let mut ctx = ControlContext {
            editor: &mut *editor,
            shared: &shared,
            modals: &mut *modals,
        };
        if let Some(target) = control.panel_ui(ui, &mut ctx) {
            self.switch(target, editor, modals, SharedValues::new());
        }
    }

    /// Runs the active control's canvas overlay
    pub fn canvas_ui(
        &mut self,
        ui: &mut egui::Ui,
        view: &super::CanvasView,
        editor: &mut Editor,
        modals: &mut dyn ModalService,
    ) {
        let Some(control) = self.current.as_mut() else {
            return;
        };
        let shared = self.shared.clone();
        let mut ctx = ControlContext {
            editor,
            shared: &shared,
            modals,
        };
        control.canvas_ui(ui, view, &mut ctx);
    }
}
