pub mod data_panel;
pub mod document_view;
pub mod page_header;

pub use data_panel::{DataPanel, DataPanelState};
pub use document_view::DocumentView;
pub use page_header::{HeaderLayout, PageHeader};
