use std::time::Duration;

use leptos::{component, view, IntoView, ReadSignal, SignalGet, SignalSet, SignalUpdate, WriteSignal};

const TOAST_DURATION: Duration = Duration::from_millis(4000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
    pub visible: bool,
}

impl Toast {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Info,
            visible: true,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: ToastKind::Error,
            visible: true,
        }
    }

    fn class(&self) -> &'static str {
        match (self.visible, self.kind) {
            (false, _) => "toast",
            (true, ToastKind::Info) => "toast toast-visible",
            (true, ToastKind::Error) => "toast toast-visible toast-error",
        }
    }
}

/// Show `toast` and hide it again after a few seconds, unless another toast replaced it
pub fn show_toast(toast: Toast, set_toast: WriteSignal<Toast>) {
    let shown = toast.clone();
    set_toast.set(toast);
    let _ = leptos::leptos_dom::helpers::set_timeout_with_handle(
        move || {
            set_toast.update(|current| {
                if *current == shown {
                    current.visible = false;
                }
            });
        },
        TOAST_DURATION,
    );
}

#[component]
#[must_use]
pub fn ToastNotification(toast: ReadSignal<Toast>) -> impl IntoView {
    view! {
        {move || {
            let t = toast.get();
            view! {
                <div class=t.class() role="status">
                    {t.visible.then_some(t.message)}
                </div>
            }
        }}
    }
}
