//! UI rendering modules.
//!
//! - `control_panel`: Left sidebar with file, column and binning controls
//! - `view_window`: One window per histogram view

mod control_panel;
mod view_window;
