use leptos::{component, view, IntoView};

use crate::error::InitError;

/// Full-screen replacement for the map when the engine cannot start
#[component]
#[must_use]
pub fn MapFallback(error: InitError) -> impl IntoView {
    let reload = move |_| {
        if let Some(window) = web_sys::window() {
            let _ = window.location().reload();
        }
    };

    view! {
        <div class="map-fallback" role="alert">
            <i class="fa-solid fa-map-location-dot"></i>
            <h2>"The interactive map is unavailable"</h2>
            <p>{error.to_string()}</p>
            <button class="primary" on:click=reload>"Reload"</button>
        </div>
    }
}
