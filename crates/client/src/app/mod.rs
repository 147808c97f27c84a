pub(crate) mod bootstrap;
mod editor_view;
pub(crate) mod loop_runner;
