pub mod models;
pub mod storefront;

#[cfg(target_arch = "wasm32")]
pub mod http;

pub use models::*;
pub use storefront::*;
