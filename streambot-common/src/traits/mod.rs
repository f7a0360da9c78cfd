pub mod api;
pub mod platform_traits;
