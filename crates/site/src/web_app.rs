use desktop_runtime::{DesktopConfig, DesktopProvider, DesktopShell, StateStore, WindowManager};
use leptos::*;
use leptos_meta::*;

#[component]
pub fn SiteApp() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Webtop" />
        <Meta name="description" content="A browser desktop with draggable windows and persisted state." />

        <main class="site-root">
            <DesktopEntry />
        </main>
    }
}

#[component]
/// Boots storage and the state store, then mounts the desktop once persisted state is loaded.
pub fn DesktopEntry() -> impl IntoView {
    let booted = create_rw_signal(None::<(StateStore, WindowManager)>);

    spawn_local(async move {
        let config = DesktopConfig::default();
        let storage = platform_storage::host_storage(config.storage.clone());
        let store = StateStore::boot(storage, &config.snapshot_key).await;
        let window_manager = WindowManager::browser(store.clone(), config);
        booted.set(Some((store, window_manager)));
    });

    move || match booted.get() {
        Some((store, window_manager)) => view! {
            <DesktopProvider store window_manager>
                <DesktopShell />
            </DesktopProvider>
        }
        .into_view(),
        None => view! { <div class="desktop-booting" aria-busy="true" /> }.into_view(),
    }
}
