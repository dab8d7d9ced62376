use leptos::{
    component, create_signal, event_target_value, view, Callable, Callback, CollectView, IntoView, ReadSignal,
    SignalGet, SignalSet, SignalWith,
};

use crate::map::registry::route_title;
use crate::map::ViewState;
use crate::models::{EndpointKind, RouteResult, TravelMode};

fn placeholder(kind: EndpointKind) -> &'static str {
    match kind {
        EndpointKind::Start => "Start: address or lat, lng",
        EndpointKind::End => "Destination: address or lat, lng",
    }
}

#[component]
fn EndpointField(
    kind: EndpointKind,
    state: ReadSignal<ViewState>,
    on_pick: Callback<EndpointKind>,
    on_text: Callback<(EndpointKind, String)>,
) -> impl IntoView {
    let display_text = move || {
        state.with(|s| match kind {
            EndpointKind::Start => s.start.display_text.clone(),
            EndpointKind::End => s.end.display_text.clone(),
        })
    };
    let picking = move || state.with(|s| s.mode == kind.picking_mode());

    view! {
        <div class="endpoint-field">
            <span class="endpoint-dot" style:background-color=kind.marker_color()></span>
            <input
                type="text"
                placeholder=placeholder(kind)
                prop:value=display_text
                on:change=move |ev| on_text.call((kind, event_target_value(&ev)))
            />
            <button
                class=move || if picking() { "pick-button active" } else { "pick-button" }
                title=format!("Pick the {} on the map", kind.label().to_lowercase())
                on:click=move |_| on_pick.call(kind)
            >
                <i class="fa-solid fa-crosshairs"></i>
            </button>
        </div>
    }
}

fn route_card(index: usize, route: RouteResult) -> impl IntoView {
    let steps = route
        .steps
        .into_iter()
        .map(|step| {
            let transit = step.transit_details.map(|t| {
                view! { <span class="step-transit">{format!("{} {} from {}", t.vehicle, t.line, t.stop)}</span> }
            });
            let meta = match (step.duration, step.distance) {
                (Some(duration), Some(distance)) => Some(format!("{duration} · {distance}")),
                (Some(value), None) | (None, Some(value)) => Some(value),
                (None, None) => None,
            };
            view! {
                <li>
                    <span class="step-instruction">{step.instruction}</span>
                    {transit}
                    {meta.map(|m| view! { <span class="step-meta">{m}</span> })}
                </li>
            }
        })
        .collect_view();

    view! {
        <section class=if index == 0 { "route-card primary" } else { "route-card" }>
            <header>
                <strong>{route_title(index)}</strong>
                <span class="route-summary">{format!("{} · {}", route.duration, route.distance)}</span>
            </header>
            <ol class="route-steps">{steps}</ol>
        </section>
    }
}

/// Start/destination entry, travel mode and the search results
#[component]
#[must_use]
pub fn RoutePanel(
    state: ReadSignal<ViewState>,
    #[prop(into)] on_pick: Callback<EndpointKind>,
    #[prop(into)] on_text: Callback<(EndpointKind, String)>,
    #[prop(into)] on_search: Callback<TravelMode>,
    #[prop(into)] on_reset: Callback<()>,
) -> impl IntoView {
    let (mode, set_mode) = create_signal(TravelMode::default());
    let loading = move || state.with(|s| s.is_loading);

    view! {
        <aside class="route-panel">
            <h2>"Plan a trip"</h2>
            <EndpointField kind=EndpointKind::Start state=state on_pick=on_pick on_text=on_text/>
            <EndpointField kind=EndpointKind::End state=state on_pick=on_pick on_text=on_text/>

            <label class="route-mode">
                "Travel mode"
                <select on:change=move |ev| {
                    if let Ok(selected) = event_target_value(&ev).parse::<TravelMode>() {
                        set_mode.set(selected);
                    }
                }>
                    {TravelMode::ALL
                        .into_iter()
                        .map(|m| view! {
                            <option value=m.as_str() selected=move || mode.get() == m>{m.label()}</option>
                        })
                        .collect_view()}
                </select>
            </label>

            <div class="route-actions">
                <button
                    class="primary"
                    prop:disabled=loading
                    on:click=move |_| on_search.call(mode.get())
                >
                    {move || if loading() { "Searching..." } else { "Find routes" }}
                </button>
                <button on:click=move |_| on_reset.call(())>"Clear"</button>
            </div>

            {move || state.with(|s| s.last_error.clone()).map(|message| view! {
                <p class="route-error">{message}</p>
            })}

            <div class="route-results">
                {move || {
                    state
                        .with(|s| s.routes.clone())
                        .into_iter()
                        .enumerate()
                        .map(|(index, route)| route_card(index, route))
                        .collect_view()
                }}
            </div>
        </aside>
    }
}
