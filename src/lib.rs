// Library root
// -----------
// The binary (`main.rs`) wires these modules into one interactive run.
//
// Module responsibilities:
// - `api`: HTTP calls to the accounts, exchange and maven endpoints.
// - `artifact`: artifact kinds and the remote URL layout.
// - `config`: endpoint base URIs from defaults, file and environment.
// - `error`: the error taxonomy and the messages shown to the user.
// - `files`: listing and filtering local build outputs.
// - `ui`: terminal prompts and spinners.
// - `workflow`: the sequential publish pipeline.
pub mod api;
pub mod artifact;
pub mod config;
pub mod error;
pub mod files;
pub mod ui;
pub mod workflow;

pub use error::{PublishError, Result};
