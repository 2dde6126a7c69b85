//! Model selection.

mod selector;

pub use selector::{ModelMenu, ModelOption, ModelSelector};
