pub mod app;
pub mod event_source;
pub mod fields;
pub mod fixture;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod panic_handler;
pub mod registry;
pub mod renderer;
pub mod scroll_task;
pub mod session;
pub mod settings;
pub mod theme;
pub mod tracker;
pub mod viewport;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use app::{App, AppAction, run_app_with_event_source};
pub use fixture::{Fixture, load_fixture};
pub use session::{ViewerConfig, ViewerSession};
