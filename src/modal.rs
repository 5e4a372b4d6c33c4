//! Modal dialogs (loading, warning, error).
//!
//! Components receive a `&mut dyn ModalService` explicitly instead of reaching for a
//! process-wide manager.

use std::collections::VecDeque;

use egui::{Align2, Color32, RichText};
use uuid::Uuid;

use crate::screens::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    Loading,
    Warning,
    Error,
}

/// What happens when the user closes a modal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    Dismiss,
    Navigate(ScreenId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    pub id: Uuid,
    pub kind: ModalKind,
    pub title: String,
    pub text: String,
    pub on_close: ModalAction,
}

impl Modal {
    /// A modal without a close button; dismiss it with [`ModalService::close`]
    pub fn loading(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ModalKind::Loading,
            title: String::new(),
            text: text.into(),
            on_close: ModalAction::Dismiss,
        }
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>, on_close: ModalAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ModalKind::Warning,
            title: title.into(),
            text: text.into(),
            on_close,
        }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>, on_close: ModalAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: ModalKind::Error,
            title: title.into(),
            text: text.into(),
            on_close,
        }
    }
}

pub trait ModalService {
    /// Queues `modal` and returns its id
    fn push(&mut self, modal: Modal) -> Uuid;

    /// Removes the modal and returns its close action, if it was still queued
    fn close(&mut self, id: Uuid) -> Option<ModalAction>;

    /// The modal currently shown
    fn front(&self) -> Option<&Modal>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// FIFO queue of modals; only the front one is visible
#[derive(Debug, Default)]
pub struct ModalManager {
    queue: VecDeque<Modal>,
}

impl ModalManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws the front modal. Returns its action if the user closed it this frame.
    pub fn show_front(&mut self, ctx: &egui::Context) -> Option<ModalAction> {
        let modal = self.queue.front()?;
        let mut closed = false;

        let title = match modal.kind {
            ModalKind::Loading => "Loading".to_owned(),
            _ => modal.title.clone(),
        };
        egui::Window::new(title)
            .id(egui::Id::new(("modal", modal.id)))
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| match modal.kind {
                ModalKind::Loading => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(&modal.text);
                    });
                }
                ModalKind::Warning | ModalKind::Error => {
                    let color = if modal.kind == ModalKind::Error {
                        Color32::from_rgb(230, 80, 80)
                    } else {
                        Color32::from_rgb(240, 180, 60)
                    };
                    ui.label(RichText::new(&modal.text).color(color));
                    ui.add_space(8.0);
                    if ui.button("Close").clicked() {
                        closed = true;
                    }
                }
            });

        if closed {
            let id = modal.id;
            return self.close(id);
        }
        None
    }
}

impl ModalService for ModalManager {
    fn push(&mut self, modal: Modal) -> Uuid {
        let id = modal.id;
        match modal.kind {
            ModalKind::Error => log::error!("{}: {}", modal.title, modal.text),
            ModalKind::Warning => log::warn!("{}: {}", modal.title, modal.text),
            ModalKind::Loading => log::debug!("loading: {}", modal.text),
        }
        self.queue.push_back(modal);
        id
    }

    fn close(&mut self, id: Uuid) -> Option<ModalAction> {
        let index = self.queue.iter().position(|modal| modal.id == id)?;
        self.queue.remove(index).map(|modal| modal.on_close)
    }

    fn front(&self) -> Option<&Modal> {
        self.queue.front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modals_queue_in_order_and_close_by_id() {
        let mut modals = ModalManager::new();
        let loading = modals.push(Modal::loading("Reading image"));
        let error = modals.push(Modal::error(
            "Webcam",
            "No webcam found",
            ModalAction::Navigate(ScreenId::Splash),
        ));

        assert_eq!(modals.front().map(|m| m.id), Some(loading));
        assert_eq!(modals.close(loading), Some(ModalAction::Dismiss));
        assert_eq!(modals.front().map(|m| m.id), Some(error));
        assert_eq!(modals.close(error), Some(ModalAction::Navigate(ScreenId::Splash)));
        assert!(modals.is_empty());
        assert_eq!(modals.close(error), None);
    }
}
