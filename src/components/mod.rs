#![allow(clippy::needless_pass_by_value)]

pub mod app;
pub mod fallback;
pub mod info_panel;
pub mod map_view;
pub mod route_panel;
pub mod shortcuts;
pub mod toast;
