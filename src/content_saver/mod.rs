//! Storage collaborator: writes session output to a mirrored directory layout

mod json_saver;

pub use json_saver::{REPORT_FILE_NAME, save_document, save_report};
