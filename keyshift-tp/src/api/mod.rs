//! HTTP API handlers for keyshift-tp

pub mod buildinfo;
pub mod health;
pub mod keys;
pub mod transpose;
pub mod ui;

pub use buildinfo::get_build_info;
pub use health::health_routes;
pub use keys::list_keys;
pub use transpose::transpose;
pub use ui::{serve_app_js, serve_index};
