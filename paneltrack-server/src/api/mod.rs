//! HTTP API handlers for paneltrack-server

pub mod advisers;
pub mod analytics;
pub mod auth;
pub mod calendar;
pub mod candidates;
pub mod health;
pub mod import;
pub mod panels;
pub mod reports;
pub mod tasks;
pub mod users;
pub mod venues;
pub mod worship_schedule;

pub use advisers::adviser_routes;
pub use analytics::analytics_routes;
pub use auth::auth_routes;
pub use calendar::calendar_routes;
pub use candidates::candidate_routes;
pub use health::health_routes;
pub use import::import_routes;
pub use panels::panel_routes;
pub use reports::report_routes;
pub use tasks::task_routes;
pub use users::user_routes;
pub use venues::venue_routes;
pub use worship_schedule::worship_schedule_routes;
