//! Dashboard editing state machine
//!
//! The editor is a pure reducer over an [`EditorSession`]: every change
//! to the working document goes through [`reduce`] as an
//! [`EditorAction`], which makes the whole editing lifecycle (edit mode,
//! dirty tracking, revert, save) unit-testable without any UI harness.
//! Asynchronous orchestration — loading and saving through the
//! persistence API — lives in the thin [`EditorCoordinator`], which
//! never mutates state itself; it only emits follow-up actions.

pub mod action;
pub mod coordinator;
pub mod reducer;
pub mod session;

pub use action::{DocumentPatch, EditorAction, GeometryChange};
pub use coordinator::{CoordinatorEvent, EditorCoordinator};
pub use reducer::reduce;
pub use session::EditorSession;
