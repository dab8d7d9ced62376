use leptos::leptos_dom::helpers::WindowListenerHandle;
use leptos::wasm_bindgen::JsCast;

/// Map-screen keyboard actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Close panels, clear routes and leave picking mode
    Reset,
    ToggleInfoPanel,
    ToggleRoutePanel,
    ResetViewport,
}

/// Action bound to `key` (a `KeyboardEvent.key` value), case-insensitive for letters
#[must_use]
pub fn key_action(key: &str) -> Option<KeyAction> {
    match key {
        "Escape" => Some(KeyAction::Reset),
        "i" | "I" => Some(KeyAction::ToggleInfoPanel),
        "b" | "B" => Some(KeyAction::ToggleRoutePanel),
        "r" | "R" => Some(KeyAction::ResetViewport),
        _ => None,
    }
}

/// Whether keystrokes aimed at this element belong to the user's typing
#[must_use]
pub fn is_text_entry(tag_name: &str) -> bool {
    matches!(tag_name.to_lowercase().as_str(), "input" | "textarea" | "select")
}

/// A keydown reduced to what shortcut dispatch looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress<'a> {
    pub key: &'a str,
    /// Tag name of the event target, if it is an element
    pub target_tag: Option<&'a str>,
    pub repeat: bool,
    /// Ctrl, Alt or Meta held
    pub modified: bool,
}

/// Action for a keydown. Escape always resets; letter shortcuts are left to form
/// fields. Repeats and Ctrl/Alt/Meta chords never dispatch.
#[must_use]
pub fn dispatch(press: &KeyPress<'_>) -> Option<KeyAction> {
    if press.repeat || press.modified {
        return None;
    }
    let action = key_action(press.key)?;
    if action != KeyAction::Reset && press.target_tag.is_some_and(is_text_entry) {
        return None;
    }
    Some(action)
}

/// Dispatch map shortcuts from window keydown events.
/// The returned handle removes the listener.
pub fn setup_map_shortcuts<F>(handler: F) -> WindowListenerHandle
where
    F: Fn(KeyAction) + 'static,
{
    leptos::leptos_dom::helpers::window_event_listener(leptos::ev::keydown, move |ev| {
        let tag = ev
            .target()
            .and_then(|target| target.dyn_into::<web_sys::Element>().ok())
            .map(|element| element.tag_name());
        let key = ev.key();
        let press = KeyPress {
            key: &key,
            target_tag: tag.as_deref(),
            repeat: ev.repeat(),
            modified: ev.ctrl_key() || ev.alt_key() || ev.meta_key(),
        };

        if let Some(action) = dispatch(&press) {
            ev.prevent_default();
            handler(action);
        }
    })
}
