//! Routes, their SEO metadata, and the guards that run on every navigation.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;

use crate::breadcrumbs::BreadcrumbStore;
use crate::session::{Language, Session};

pub const SITE_NAME: &str = "Shop Name";

static PRODUCT_DETAIL_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/name/product/detail/([^/]+)$").unwrap());
static SHOW_DETAIL_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/name/shows/([^/]+)$").unwrap());
// Relative paths are joined onto this to get at their query string.
static SITE_BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    ProductDetails { id: String },
    Faq,
    Contacts,
    Search { query: Option<String> },
    ShowDetails { id: String },
    Shows,
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => "home",
            Route::Products => "products",
            Route::ProductDetails { .. } => "product-details",
            Route::Faq => "faq",
            Route::Contacts => "contacts",
            Route::Search { .. } => "search",
            Route::ShowDetails { .. } => "showDetails",
            Route::Shows => "shows",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/name/home".to_string(),
            Route::Products => "/name/products".to_string(),
            Route::ProductDetails { id } => format!("/name/product/detail/{id}"),
            Route::Faq => "/name/faq".to_string(),
            Route::Contacts => "/name/contacts".to_string(),
            Route::Search { query: None } => "/name/search/products".to_string(),
            Route::Search { query: Some(q) } => {
                let mut url = SITE_BASE.clone();
                url.set_path("/name/search/products");
                url.query_pairs_mut().append_pair("text", q);
                format!("{}?{}", url.path(), url.query().unwrap_or_default())
            }
            Route::ShowDetails { id } => format!("/name/shows/{id}"),
            Route::Shows => "/name/shows".to_string(),
        }
    }

    /// Maps a path (optionally with a query string) to a route. `/` and
    /// anything unknown redirect home.
    pub fn resolve(target: &str) -> Route {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
        match path {
            "/name/home" => Route::Home,
            "/name/products" => Route::Products,
            "/name/faq" => Route::Faq,
            "/name/contacts" => Route::Contacts,
            "/name/shows" => Route::Shows,
            "/name/search/products" => Route::Search { query: text_param(target) },
            _ => {
                if let Some(caps) = PRODUCT_DETAIL_PATH.captures(path) {
                    Route::ProductDetails { id: caps[1].to_string() }
                } else if let Some(caps) = SHOW_DETAIL_PATH.captures(path) {
                    Route::ShowDetails { id: caps[1].to_string() }
                } else {
                    Route::Home
                }
            }
        }
    }

    pub fn meta(&self) -> &'static RouteMeta {
        match self {
            Route::Home => &HOME_META,
            Route::Products => &PRODUCT_LIST_META,
            Route::ProductDetails { .. } => &PRODUCT_META,
            Route::Faq => &FAQ_META,
            Route::Contacts => &CONTACT_META,
            Route::Search { .. } => &SEARCH_META,
            Route::ShowDetails { .. } => &SHOW_META,
            Route::Shows => &SHOW_LIST_META,
        }
    }

    /// The `name` route parameter, when the route carries one.
    fn name_param(&self) -> Option<&str> {
        match self {
            Route::ProductDetails { id } | Route::ShowDetails { id } => Some(id.as_str()),
            _ => None,
        }
    }
}

fn text_param(target: &str) -> Option<String> {
    let url = SITE_BASE.join(target).ok()?;
    url.query_pairs().find(|(key, _)| *key == "text").map(|(_, value)| value.into_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaContent {
    Plain(&'static str),
    Localized { ita: &'static str, eng: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetaTag {
    pub name: Option<&'static str>,
    pub property: Option<&'static str>,
    pub content: MetaContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMeta {
    pub title: &'static str,
    pub titolo: &'static str,
    pub metatags: &'static [MetaTag],
}

/// A meta tag with its content resolved for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedTag {
    pub name: Option<&'static str>,
    pub property: Option<&'static str>,
    pub content: String,
}

pub fn localize_meta_tags(tags: &[MetaTag], lang: Language) -> Vec<LocalizedTag> {
    tags.iter()
        .map(|tag| LocalizedTag {
            name: tag.name,
            property: tag.property,
            content: match (tag.content, lang) {
                (MetaContent::Plain(s), _) => s.to_string(),
                (MetaContent::Localized { ita, .. }, Language::Ita) => ita.to_string(),
                (MetaContent::Localized { eng, .. }, Language::Eng) => eng.to_string(),
            },
        })
        .collect()
}

const fn named(name: &'static str, ita: &'static str, eng: &'static str) -> MetaTag {
    MetaTag { name: Some(name), property: None, content: MetaContent::Localized { ita, eng } }
}

const fn og_title(ita: &'static str, eng: &'static str) -> MetaTag {
    MetaTag { name: None, property: Some("og:title"), content: MetaContent::Localized { ita, eng } }
}

const fn og_url(url: &'static str) -> MetaTag {
    MetaTag { name: None, property: Some("og:url"), content: MetaContent::Plain(url) }
}

const DESCRIPTION_ITA: &str =
    "Antiquariato, modernariato e design: scopri gli ultimi arrivi e le fiere a cui partecipiamo.";
const DESCRIPTION_ENG: &str = "Antiques, vintage and design: browse our latest arrivals and the shows we attend.";

static HOME_META: RouteMeta = RouteMeta {
    title: "Home",
    titolo: "Home",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "prodotti, fiere", "products, exhibitions"),
        og_title("Home | Shop Name", "Home | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/home"),
    ],
};

static PRODUCT_LIST_META: RouteMeta = RouteMeta {
    title: "Products",
    titolo: "Prodotti",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "prodotti", "products"),
        og_title("Prodotti | Shop Name Store", "Products | Shop Name Store"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/products"),
    ],
};

static PRODUCT_META: RouteMeta = RouteMeta {
    title: "Product Details",
    titolo: "Dettagli del Prodotto",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "dettagli, prodotto", "details, product"),
        og_title("Dettagli del Prodotto | Shop Name", "Product Details | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/product/detail/:id"),
    ],
};

static FAQ_META: RouteMeta = RouteMeta {
    title: "FAQ",
    titolo: "FAQ",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "FAQ, domande frequenti", "FAQ, frequently asked questions"),
        og_title("FAQ | Shop Name", "FAQ | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/faq"),
    ],
};

static CONTACT_META: RouteMeta = RouteMeta {
    title: "Contacts",
    titolo: "Contatti",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "contatti, informazioni, prodotti", "contacts, information, products"),
        og_title("Contatti | Shop Name", "Contacts | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/contacts"),
    ],
};

static SEARCH_META: RouteMeta = RouteMeta {
    title: "Search",
    titolo: "Ricerca",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "ricerca, ricerca prodotti", "search, product search"),
        og_title("Ricerca | Shop Name", "Search | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/search"),
    ],
};

static SHOW_LIST_META: RouteMeta = RouteMeta {
    title: "Shows",
    titolo: "Fiere",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "show, exhibitions", "show, exhibitions"),
        og_title("Fiere | Shop Name", "Exhibitions | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/shows"),
    ],
};

static SHOW_META: RouteMeta = RouteMeta {
    title: "Show Details",
    titolo: "Dettaglio Fiera",
    metatags: &[
        named("description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        named("keywords", "website, show, event", "website, show, event"),
        og_title("Dettaglio Fiera | Shop Name", "Show Details | Shop Name"),
        named("og:description", DESCRIPTION_ITA, DESCRIPTION_ENG),
        og_url("https://www.shop-name.com/name/shows/:id"),
    ],
};

/// Everything the document head needs after a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHead {
    pub title: String,
    /// `it` or `en`.
    pub lang: &'static str,
    pub meta: Vec<LocalizedTag>,
    pub scroll_to_top: bool,
}

/// Entering the product list from anywhere but the list itself or a product
/// page starts a fresh category path.
pub fn should_reset_breadcrumbs(from: &Route, to: &Route) -> bool {
    matches!(to, Route::Products) && !matches!(from, Route::Products | Route::ProductDetails { .. })
}

/// Home -> home and shows -> shows keep their scroll position.
pub fn scroll_to_top(from: &Route, to: &Route) -> bool {
    !matches!((from, to), (Route::Home, Route::Home) | (Route::Shows, Route::Shows))
}

pub struct Router<'a> {
    session: &'a Session,
    breadcrumbs: &'a mut BreadcrumbStore,
}

impl<'a> Router<'a> {
    pub fn new(session: &'a Session, breadcrumbs: &'a mut BreadcrumbStore) -> Self {
        Self { session, breadcrumbs }
    }

    /// Runs the before-each guards: language, meta tags, breadcrumb reset.
    pub fn navigate(&mut self, from: &Route, to: &Route) -> PageHead {
        tracing::debug!(from = from.name(), to = to.name(), "navigating");
        let (title, lang) = self.handle_language(to);
        let meta = self.handle_meta_tags(to);
        if should_reset_breadcrumbs(from, to) {
            self.breadcrumbs.reset_breadcrumbs();
        }
        PageHead { title, lang, meta, scroll_to_top: scroll_to_top(from, to) }
    }

    fn handle_language(&self, to: &Route) -> (String, &'static str) {
        let language = self.session.language();
        self.session.persist_language();
        let meta = to.meta();
        let title = match (language, meta.title.is_empty()) {
            (Language::Eng, false) => format!("{} | {SITE_NAME}", meta.title),
            (Language::Ita, false) => format!("{} | {SITE_NAME}", meta.titolo),
            (_, true) => match to.name_param() {
                Some(name) => format!("{name} | {SITE_NAME}"),
                None => SITE_NAME.to_string(),
            },
        };
        (title, language.html_lang())
    }

    fn handle_meta_tags(&self, to: &Route) -> Vec<LocalizedTag> {
        localize_meta_tags(to.meta().metatags, self.session.language())
    }
}
