pub mod app;
pub mod panel;
pub mod selection;
pub mod tree;
