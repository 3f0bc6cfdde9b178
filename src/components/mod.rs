//! UI Components
//!
//! Reusable Leptos components.

mod delete_confirm_button;
mod error_banner;
mod new_ticket_form;
mod pool_column;
mod sun_overlay;
mod ticket_block;
mod ticket_details;
mod time_axis;
mod timeline_view;
mod zoom_bar;

pub use delete_confirm_button::DeleteConfirmButton;
pub use error_banner::ErrorBanner;
pub use new_ticket_form::NewTicketForm;
pub use pool_column::PoolColumn;
pub use sun_overlay::SunOverlay;
pub use ticket_block::TicketBlock;
pub use ticket_details::TicketDetails;
pub use time_axis::TimeAxis;
pub use timeline_view::TimelineView;
pub use zoom_bar::ZoomBar;
