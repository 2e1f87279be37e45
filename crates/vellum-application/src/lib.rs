//! Application layer of Vellum: the operation surface the UI drives.

pub mod workbench;

pub use workbench::Workbench;
