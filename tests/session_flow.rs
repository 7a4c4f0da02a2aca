mod common;

use std::sync::Arc;

use serde_json::json;

use common::{HOST, ScriptedTransport, Step, client};
use shopfront::api::ApiClient;
use shopfront::breadcrumbs::{BreadcrumbStore, Breadcrumb, default_trail};
use shopfront::config::Settings;
use shopfront::router::{Route, Router};
use shopfront::error::{ApiError, ErrorKind};
use shopfront::session::{CONFIG_URI, ConfigLoad, Language, Session, fetch_config};
use shopfront::storage::{BREADCRUMBS_KEY, CONFIG_KEY, FileStore, KeyValueStore, Storage};

fn site_config() -> serde_json::Value {
    json!({
        "pagination": { "homeProductPagePagination": 8 },
        "settings": { "websiteMaintenance": false, "bannerImg": "banner.jpg" },
        "titles": { "homeTitleText": { "ita": "Benvenuti", "eng": "Welcome" } }
    })
}

#[tokio::test]
async fn config_503_means_maintenance() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 503, None);
    let api = client(transport);
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&api).await, ConfigLoad::Maintenance);
}

#[tokio::test]
async fn config_without_body_means_maintenance() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 200, None);
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&client(transport)).await, ConfigLoad::Maintenance);
}

#[tokio::test]
async fn config_fetch_reports_maintenance_as_an_api_error() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 503, None);
    transport.respond(CONFIG_URI, 200, Some(json!(null)));
    transport.respond(CONFIG_URI, 404, None);
    let api = client(transport);

    assert!(matches!(fetch_config(&api).await, Err(ApiError::Maintenance)));
    assert_eq!(fetch_config(&api).await.unwrap_err().kind(), ErrorKind::Maintenance);
    assert_eq!(fetch_config(&api).await.unwrap_err().kind(), ErrorKind::Server);
}

#[tokio::test]
async fn config_transport_failure_is_an_error() {
    let transport = ScriptedTransport::new();
    transport.push(CONFIG_URI, Step::Fail("dns lookup failed".into()));
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&client(transport)).await, ConfigLoad::Error);
}

#[tokio::test]
async fn config_other_status_is_an_error() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 500, Some(json!({ "message": "boom" })));
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&client(transport)).await, ConfigLoad::Error);
}

#[tokio::test]
async fn config_is_cached_for_the_session() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 200, Some(site_config()));
    let api = client(transport.clone());
    let storage = Storage::in_memory();

    let mut session = Session::new(storage.clone());
    assert_eq!(session.load_config(&api).await, ConfigLoad::Success);
    assert_eq!(session.config().pagination.home_product_page_pagination, Some(8));
    assert!(storage.session.get(CONFIG_KEY).is_some());

    // Nothing else is scripted: a second API hit would come back as an error.
    let mut reloaded = Session::new(storage);
    assert_eq!(reloaded.load_config(&api).await, ConfigLoad::Success);
    assert_eq!(reloaded.config().titles.home_title_text.get(Language::Eng), "Welcome");
    assert_eq!(transport.calls().len(), 1);

    assert_eq!(reloaded.reload_config(&api).await, ConfigLoad::Error);
}

#[tokio::test]
async fn config_flagged_for_maintenance_switches_the_site_off() {
    let transport = ScriptedTransport::new();
    transport.respond(CONFIG_URI, 200, Some(json!({ "settings": { "websiteMaintenance": true } })));
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&client(transport)).await, ConfigLoad::Maintenance);
}

#[tokio::test]
async fn prefetched_config_skips_the_api() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fe_config.json");
    std::fs::write(&path, site_config().to_string()).unwrap();

    let mut settings = Settings::with_host(HOST);
    settings.prefetched_config = Some(path.display().to_string());
    let transport = ScriptedTransport::new();
    let api = ApiClient::new(settings, transport.clone());
    let mut session = Session::new(Storage::in_memory());

    assert_eq!(session.load_config(&api).await, ConfigLoad::Success);
    assert_eq!(session.config().settings.banner_img, "banner.jpg");
    assert!(transport.calls().is_empty());
}

#[test]
fn entering_products_from_home_resets_the_trail() {
    let session = Session::new(Storage::in_memory());
    let mut crumbs = BreadcrumbStore::new(session.storage().session.clone());
    crumbs.set_breadcrumb(0, "Lampade", "Lamps", Some(1), None);
    crumbs.set_breadcrumb(1, "Da tavolo", "Table", Some(4), Some(1));

    let head = Router::new(&session, &mut crumbs).navigate(&Route::Home, &Route::Products);

    assert_eq!(crumbs.breadcrumbs(), &default_trail());
    assert_eq!(head.title, "Prodotti | Shop Name");
    assert_eq!(head.lang, "it");
    assert!(head.scroll_to_top);
}

#[test]
fn returning_from_a_product_keeps_the_trail() {
    let session = Session::new(Storage::in_memory());
    let mut crumbs = BreadcrumbStore::new(session.storage().session.clone());
    crumbs.set_breadcrumb(0, "Lampade", "Lamps", Some(1), None);
    let detail = Route::resolve("/name/product/detail/31");

    let mut router = Router::new(&session, &mut crumbs);
    router.navigate(&Route::Products, &detail);
    router.navigate(&detail, &Route::Products);
    router.navigate(&Route::Products, &Route::Products);

    assert_eq!(crumbs.expanded_category_index(), Some(1));
}

#[test]
fn navigation_uses_the_stored_language() {
    let storage = Storage::in_memory();
    let mut session = Session::new(storage.clone());
    session.change_language();
    let mut crumbs = BreadcrumbStore::new(storage.session.clone());

    let head = Router::new(&session, &mut crumbs).navigate(&Route::Home, &Route::Shows);

    assert_eq!(head.title, "Shows | Shop Name");
    assert_eq!(head.lang, "en");
    let og_title = head.meta.iter().find(|t| t.property == Some("og:title")).unwrap();
    assert_eq!(og_title.content, "Exhibitions | Shop Name");
}

#[test]
fn breadcrumbs_survive_a_reload_through_the_session_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions").join("tab.toml");
    {
        let session: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
        let mut crumbs = BreadcrumbStore::new(session);
        crumbs.set_breadcrumb(0, "Lampade", "Lamps", Some(1), None);
        crumbs.set_breadcrumb(1, "Da terra", "Floor", Some(6), Some(1));
        crumbs.set_breadcrumb(2, "Ottone", "Brass", Some(14), Some(6));
    }

    let session: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&path).unwrap());
    let crumbs = BreadcrumbStore::new(session.clone());
    assert_eq!(
        crumbs.breadcrumbs()[2],
        Breadcrumb {
            lvl: 2,
            label_ita: "Ottone".into(),
            label_eng: "Brass".into(),
            expanded_index: Some(14),
            parent_index: Some(6),
        }
    );
    assert_eq!(crumbs.expanded_inner_category_index(), Some(6));

    session.set(BREADCRUMBS_KEY, "definitely not json");
    assert_eq!(BreadcrumbStore::new(session.clone()).breadcrumbs(), &default_trail());
    session.remove(BREADCRUMBS_KEY);
    assert_eq!(BreadcrumbStore::new(session).breadcrumbs(), &default_trail());
}

#[test]
fn default_trail_matches_the_documented_triple() {
    let json = serde_json::to_value(default_trail()).unwrap();
    assert_eq!(
        json,
        json!([
            {
                "lvl": 0, "label_ita": "Ultimi Arrivi", "label_eng": "Latest Arrivals",
                "expandedIndex": null, "parent_index": null
            },
            { "lvl": 1, "label_ita": "", "label_eng": "", "expandedIndex": null, "parent_index": null },
            { "lvl": 2, "label_ita": "", "label_eng": "", "expandedIndex": null, "parent_index": null }
        ])
    );
}
