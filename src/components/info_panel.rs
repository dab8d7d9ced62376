use leptos::{
    component, create_signal, event_target_value, view, Callable, Callback, CollectView, IntoView, ReadSignal,
    SignalGet, SignalSet, SignalWith,
};

use crate::map::ViewState;
use crate::models::EndpointKind;

/// Viewport readout and the saved places list
#[component]
#[must_use]
pub fn InfoPanel(
    state: ReadSignal<ViewState>,
    #[prop(into)] on_save: Callback<(EndpointKind, String)>,
    #[prop(into)] on_delete: Callback<String>,
) -> impl IntoView {
    let (title, set_title) = create_signal(String::new());

    let save = move |kind: EndpointKind| {
        on_save.call((kind, title.get()));
        set_title.set(String::new());
    };
    let cannot_save = move |kind: EndpointKind| {
        state.with(|s| match kind {
            EndpointKind::Start => s.start.coordinates.is_none(),
            EndpointKind::End => s.end.coordinates.is_none(),
        })
    };

    view! {
        <aside class="info-panel">
            <h2>"Map"</h2>
            <dl class="viewport-info">
                <dt>"Zoom"</dt>
                <dd>{move || state.with(|s| s.viewport.zoom_text())}</dd>
                <dt>"Center"</dt>
                <dd>{move || state.with(|s| s.viewport.center_text())}</dd>
            </dl>

            <h3>"Saved places"</h3>
            <div class="save-marker">
                <input
                    type="text"
                    placeholder="Name this place"
                    prop:value=move || title.get()
                    on:input=move |ev| set_title.set(event_target_value(&ev))
                />
                <button prop:disabled=move || cannot_save(EndpointKind::Start) on:click=move |_| save(EndpointKind::Start)>
                    "Save start"
                </button>
                <button prop:disabled=move || cannot_save(EndpointKind::End) on:click=move |_| save(EndpointKind::End)>
                    "Save destination"
                </button>
            </div>

            <ul class="marker-list">
                {move || {
                    state
                        .with(|s| s.markers.clone())
                        .into_iter()
                        .map(|marker| {
                            let id = marker.id.clone();
                            view! {
                                <li>
                                    <span class="marker-swatch" style:background-color=marker.color.clone()></span>
                                    <span class="marker-title">{marker.title.clone()}</span>
                                    <span class="marker-coords">{marker.position().display_text()}</span>
                                    <button class="icon-button" title="Delete" on:click=move |_| on_delete.call(id.clone())>
                                        <i class="fa-solid fa-trash"></i>
                                    </button>
                                </li>
                            }
                        })
                        .collect_view()
                }}
            </ul>
        </aside>
    }
}
