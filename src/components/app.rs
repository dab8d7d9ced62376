use leptos::*;
use leptos_meta::*;

use crate::components::map_view::MapScreen;
use crate::config::AppConfig;

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Transit Map"/>

        <div class="app">
            <MapScreen config=AppConfig::from_build_env()/>
        </div>
    }
}
