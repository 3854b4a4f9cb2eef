//! State engine of a dual-pane remote file browser: a lazily loaded
//! directory tree, two independently navigable panels with history and
//! selection, and a shared clipboard.

pub mod config;
pub mod error;
pub mod services;
pub mod ui;
pub mod utils;

pub use config::Settings;
pub use error::{FmError, Result};
pub use services::messages::Messages;
pub use services::remote::{DirectoryService, HttpDirectoryService};
pub use ui::app::App;
pub use ui::panel::{PanelSide, PanelState};
pub use ui::tree::TreeCache;
