#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod components;
pub mod config;
pub mod controls;
pub mod editor;
pub mod error;
pub mod event;
pub mod export;
pub mod file_handler;
pub mod geometry;
pub mod modal;
pub mod operation;
pub mod screens;
pub mod sdk;
pub mod shared_state;
pub mod texture_manager;
pub mod widgets;

pub use app::PhotoEditorApp;
pub use config::EditorOptions;
pub use editor::{Editor, Feature, Zoom};
pub use error::{EditorError, EditorResult};
pub use event::{EditorEvent, EventHandler};
pub use modal::{Modal, ModalAction, ModalManager, ModalService};
pub use operation::Operation;
