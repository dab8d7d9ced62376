use leptos::leptos_dom::helpers::WindowListenerHandle;
use leptos::logging::error;
use leptos::{
    component, create_effect, create_node_ref, create_signal, on_cleanup, spawn_local, store_value, view, IntoView,
    Show, SignalGet, SignalSet, SignalUpdate, SignalWith, StoredValue, WriteSignal,
};

use super::fallback::MapFallback;
use super::info_panel::InfoPanel;
use super::route_panel::RoutePanel;
use super::shortcuts::{setup_map_shortcuts, KeyAction};
use super::toast::{show_toast, Toast, ToastNotification};
use crate::api::HttpApi;
use crate::config::AppConfig;
use crate::error::{InitError, RouteError};
use crate::log;
use crate::map::{geolocation, MapView, MapboxEngine, ViewState};
use crate::models::{EndpointKind, TravelMode};

type ActiveMap = MapView<MapboxEngine>;

fn toggle_fullscreen() {
    let Some(document) = web_sys::window().and_then(|window| window.document()) else { return };
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
    } else if let Some(root) = document.document_element() {
        if let Err(e) = root.request_fullscreen() {
            error!("Fullscreen request failed: {e:?}");
        }
    }
}

fn search(view: ActiveMap, api: HttpApi, mode: TravelMode, set_toast: WriteSignal<Toast>) {
    spawn_local(async move {
        match view.search(&api, mode).await {
            Ok(count) => {
                log!("Rendered {} routes", count);
            }
            Err(RouteError::Superseded) => {}
            Err(e) => show_toast(Toast::error(e.to_string()), set_toast),
        }
    });
}

fn save_marker(view: ActiveMap, api: HttpApi, kind: EndpointKind, title: String, set_toast: WriteSignal<Toast>) {
    spawn_local(async move {
        match view.save_endpoint_as_marker(&api, kind, &title).await {
            Ok(marker) => show_toast(Toast::info(format!("Saved \"{}\"", marker.title)), set_toast),
            Err(e) => show_toast(Toast::error(e.to_string()), set_toast),
        }
    });
}

fn delete_marker(view: ActiveMap, api: HttpApi, id: String, set_toast: WriteSignal<Toast>) {
    spawn_local(async move {
        match view.delete_marker(&api, &id).await {
            Ok(true) => show_toast(Toast::info("Place removed"), set_toast),
            Ok(false) => show_toast(Toast::error("That place no longer exists"), set_toast),
            Err(e) => show_toast(Toast::error(e.to_string()), set_toast),
        }
    });
}

fn locate(view: ActiveMap, set_toast: WriteSignal<Toast>) {
    spawn_local(async move {
        if let Err(e) = view.locate(geolocation::current_position()).await {
            show_toast(Toast::error(format!("Could not find your location: {e}")), set_toast);
        }
    });
}

/// The map, its panels and controls. Falls back to a static screen when the
/// engine cannot start.
#[component]
#[must_use]
pub fn MapScreen(config: AppConfig) -> impl IntoView {
    let container_ref = create_node_ref::<leptos::html::Div>();
    let (state, set_state) = create_signal(ViewState::default());
    let (init_error, set_init_error) = create_signal(None::<InitError>);
    let (show_route_panel, set_show_route_panel) = create_signal(true);
    let (show_info_panel, set_show_info_panel) = create_signal(false);
    let (toast, set_toast) = create_signal(Toast::default());

    let api = HttpApi::from_config(&config);
    let map_config = config.map;
    let mounted: StoredValue<Option<ActiveMap>> = store_value(None);
    let shortcuts: StoredValue<Option<WindowListenerHandle>> = store_value(None);
    let current = move || mounted.get_value();

    // Mount once the container exists
    let started = store_value(false);
    let mount_api = api.clone();
    create_effect(move |_| {
        let Some(container) = container_ref.get() else { return };
        if started.get_value() {
            return;
        }
        started.set_value(true);

        let element: web_sys::HtmlElement = (*container).clone().into();
        let api = mount_api.clone();
        let map_config = map_config.clone();
        spawn_local(async move {
            let mounted_view = ActiveMap::mount_and_load(&element, map_config, &api, |view| {
                view.set_listener(move |s| set_state.set(s.clone()));
                set_state.set(view.state());
                mounted.set_value(Some(view.clone()));
            })
            .await;
            if let Err(e) = mounted_view {
                error!("Map initialization failed: {e}");
                set_init_error.set(Some(e));
            }
        });
    });

    let handle = setup_map_shortcuts(move |action| match action {
        KeyAction::Reset => {
            set_show_route_panel.set(false);
            set_show_info_panel.set(false);
            if let Some(view) = current() {
                view.reset();
            }
        }
        KeyAction::ToggleInfoPanel => set_show_info_panel.update(|open| *open = !*open),
        KeyAction::ToggleRoutePanel => set_show_route_panel.update(|open| *open = !*open),
        KeyAction::ResetViewport => {
            if let Some(view) = current() {
                view.reset_viewport();
            }
        }
    });
    shortcuts.set_value(Some(handle));

    on_cleanup(move || {
        if let Some(handle) = shortcuts.try_update_value(Option::take).flatten() {
            handle.remove();
        }
        if let Some(view) = mounted.try_update_value(Option::take).flatten() {
            view.unmount();
        }
    });

    let on_pick = move |kind: EndpointKind| {
        if let Some(view) = current() {
            view.toggle_picking(kind);
        }
    };
    let on_text = move |(kind, text): (EndpointKind, String)| {
        if let Some(view) = current() {
            view.set_endpoint_text(kind, &text);
        }
    };
    let search_api = api.clone();
    let on_search = move |mode: TravelMode| {
        if let Some(view) = current() {
            search(view, search_api.clone(), mode, set_toast);
        }
    };
    let on_reset = move |()| {
        if let Some(view) = current() {
            view.reset();
        }
    };
    let save_api = api.clone();
    let on_save = move |(kind, title): (EndpointKind, String)| {
        if let Some(view) = current() {
            save_marker(view, save_api.clone(), kind, title, set_toast);
        }
    };
    let on_delete = move |id: String| {
        if let Some(view) = current() {
            delete_marker(view, api.clone(), id, set_toast);
        }
    };

    view! {
        <div class="map-screen">
            {move || init_error.get().map(|error| view! { <MapFallback error=error/> })}

            <div class="map-container" node_ref=container_ref></div>

            <Show when=move || init_error.get().is_none()>
                <div class="map-controls">
                    <button
                        class=move || if state.with(|s| s.is_locating) { "map-control active" } else { "map-control" }
                        title="Show my location"
                        on:click=move |_| {
                            if let Some(view) = current() {
                                locate(view, set_toast);
                            }
                        }
                    >
                        <i class="fa-solid fa-location-crosshairs"></i>
                    </button>
                    <button
                        class="map-control"
                        title="Reset view (R)"
                        on:click=move |_| {
                            if let Some(view) = current() {
                                view.reset_viewport();
                            }
                        }
                    >
                        <i class="fa-solid fa-house"></i>
                    </button>
                    <button class="map-control" title="Fullscreen" on:click=move |_| toggle_fullscreen()>
                        <i class="fa-solid fa-expand"></i>
                    </button>
                    <button
                        class=move || if show_route_panel.get() { "map-control active" } else { "map-control" }
                        title="Routes (B)"
                        on:click=move |_| set_show_route_panel.update(|open| *open = !*open)
                    >
                        <i class="fa-solid fa-route"></i>
                    </button>
                    <button
                        class=move || if show_info_panel.get() { "map-control active" } else { "map-control" }
                        title="Map info (I)"
                        on:click=move |_| set_show_info_panel.update(|open| *open = !*open)
                    >
                        <i class="fa-solid fa-circle-info"></i>
                    </button>
                </div>
            </Show>

            <Show when=move || show_route_panel.get() && init_error.get().is_none()>
                <RoutePanel
                    state=state
                    on_pick=on_pick
                    on_text=on_text.clone()
                    on_search=on_search.clone()
                    on_reset=on_reset
                />
            </Show>

            <Show when=move || show_info_panel.get() && init_error.get().is_none()>
                <InfoPanel state=state on_save=on_save.clone() on_delete=on_delete.clone()/>
            </Show>

            <ToastNotification toast=toast/>
        </div>
    }
}
