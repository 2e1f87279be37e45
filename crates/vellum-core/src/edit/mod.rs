//! Document draft editing.
//!
//! # Module Structure
//!
//! - `model`: draft building blocks (`FieldRow`, `DraftTarget`)
//! - `editor`: the bidirectional row/text synchronizer (`DraftEditor`)

mod editor;
mod model;

pub use editor::DraftEditor;
pub use model::{DraftTarget, FieldRow};
