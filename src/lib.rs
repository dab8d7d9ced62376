#[cfg(feature = "client")]
pub mod api;
#[cfg(feature = "client")]
pub mod components;
#[cfg(feature = "client")]
pub mod config;
pub mod constants;
#[cfg(feature = "client")]
pub mod error;
#[cfg(feature = "client")]
pub mod logging;
#[cfg(feature = "client")]
pub mod map;
pub mod models;
#[cfg(feature = "client")]
pub mod utils;

#[cfg(feature = "client")]
pub use components::app::App;
