use crate::config::EditorOptions;
use crate::editor::Editor;

use super::Control;
use super::adjustments::AdjustmentsControl;
use super::brush::BrushControl;
use super::crop::CropControl;
use super::filters::FiltersControl;
use super::focus::FocusControl;
use super::frame::FrameControl;
use super::orientation::OrientationControl;
use super::stickers::StickersControl;
use super::text::TextControl;

type ControlFactory = fn(&EditorOptions) -> Box<dyn Control>;

/// Static description of one control: its identifier and how to build it
#[derive(Clone, Copy)]
pub struct ControlDescriptor {
    pub identifier: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    factory: ControlFactory,
}

impl std::fmt::Debug for ControlDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlDescriptor")
            .field("identifier", &self.identifier)
            .finish()
    }
}

impl ControlDescriptor {
    pub fn create(&self, options: &EditorOptions) -> Box<dyn Control> {
        (self.factory)(options)
    }
}

const ALL_CONTROLS: [ControlDescriptor; 9] = [
    ControlDescriptor {
        identifier: "crop",
        label: "Crop",
        icon: "⛶",
        factory: |options| Box::new(CropControl::new(options)),
    },
    ControlDescriptor {
        identifier: "orientation",
        label: "Orientation",
        icon: "⟳",
        factory: |_| Box::new(OrientationControl::new()),
    },
    ControlDescriptor {
        identifier: "filters",
        label: "Filters",
        icon: "◐",
        factory: |options| Box::new(FiltersControl::new(options)),
    },
    ControlDescriptor {
        identifier: "adjustments",
        label: "Adjust",
        icon: "☀",
        factory: |_| Box::new(AdjustmentsControl::new()),
    },
    ControlDescriptor {
        identifier: "focus",
        label: "Focus",
        icon: "◎",
        factory: |_| Box::new(FocusControl::new()),
    },
    ControlDescriptor {
        identifier: "frame",
        label: "Frame",
        icon: "▣",
        factory: |options| Box::new(FrameControl::new(options)),
    },
    ControlDescriptor {
        identifier: "stickers",
        label: "Stickers",
        icon: "☺",
        factory: |options| Box::new(StickersControl::new(options)),
    },
    ControlDescriptor {
        identifier: "text",
        label: "Text",
        icon: "T",
        factory: |options| Box::new(TextControl::new(options)),
    },
    ControlDescriptor {
        identifier: "brush",
        label: "Brush",
        icon: "✎",
        factory: |options| Box::new(BrushControl::new(options)),
    },
];

/// Lookup from identifier to control descriptor, filtered and grouped by the editor options
#[derive(Debug, Clone)]
pub struct ControlsRegistry {
    groups: Vec<Vec<ControlDescriptor>>,
}

impl ControlsRegistry {
    pub fn new(options: &EditorOptions) -> Self {
        let groups = options
            .ordered_controls()
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(|identifier| {
                        let descriptor = Self::descriptor(identifier);
                        if descriptor.is_none() {
                            log::warn!("no control named `{}`", identifier);
                        }
                        descriptor
                    })
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect();
        Self { groups }
    }

    /// Every built-in descriptor, independent of configuration
    pub fn descriptor(identifier: &str) -> Option<ControlDescriptor> {
        ALL_CONTROLS
            .iter()
            .find(|descriptor| descriptor.identifier == identifier)
            .copied()
    }

    pub fn get(&self, identifier: &str) -> Option<&ControlDescriptor> {
        self.groups
            .iter()
            .flatten()
            .find(|descriptor| descriptor.identifier == identifier)
    }

    pub fn groups(&self) -> &[Vec<ControlDescriptor>] {
        &self.groups
    }

    /// Groups reduced to the controls that can run against `editor`
    pub fn available_groups(&self, editor: &Editor, options: &EditorOptions) -> Vec<Vec<ControlDescriptor>> {
        self.groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter(|descriptor| descriptor.create(options).is_available(editor))
                    .copied()
                    .collect::<Vec<_>>()
            })
            .filter(|group| !group.is_empty())
            .collect()
    }
}
