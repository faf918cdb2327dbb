pub mod auth;
pub mod catalogue;
pub mod category;
pub mod menu_item;
pub mod user;

mod router;
pub use router::get_router;
