//! Error Banner Component

use leptos::prelude::*;

use crate::store::{store_clear_error, use_app_store, AppStateStoreFields};

/// Last failed operation, until dismissed
#[component]
pub fn ErrorBanner() -> impl IntoView {
    let store = use_app_store();

    view! {
        {move || store.error().get().map(|message| view! {
            <div class="error-banner" role="alert">
                <span>{message}</span>
                <button class="dismiss" on:click=move |_| store_clear_error(&store)>"✕"</button>
            </div>
        })}
    }
}
