use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::api::{ApiClient, Outcome};
use crate::error::ApiError;
use crate::models::{Category, Contact, Faq, Page, Product, ProductsList, Show, ShowCarousel, ShowList};
use crate::status::{CallName, CallStatus};

/// Pages fetched so far, keyed by page number, plus the server-side total.
#[derive(Debug, Clone)]
pub struct PagedCache<T> {
    pub total: u64,
    pages: HashMap<u32, Vec<T>>,
}

impl<T> Default for PagedCache<T> {
    fn default() -> Self {
        Self { total: 0, pages: HashMap::new() }
    }
}

impl<T: Clone> PagedCache<T> {
    pub fn page(&self, page: u32) -> Option<Page<T>> {
        self.pages.get(&page).map(|data| Page { data: data.clone(), total: self.total })
    }

    fn store(&mut self, page: u32, fetched: &Page<T>) {
        self.total = fetched.total;
        self.pages.insert(page, fetched.data.clone());
    }

    fn clear(&mut self) {
        self.total = 0;
        self.pages.clear();
    }
}

#[derive(Default)]
struct Cached {
    latest: PagedCache<ProductsList>,
    show_new: Option<Vec<ShowCarousel>>,
    show_old: PagedCache<ShowList>,
    product_detail: HashMap<u64, Product>,
    search_query: Option<String>,
    search: PagedCache<ProductsList>,
    categories: Option<Vec<Category>>,
    faqs: Option<Vec<Faq>>,
    contacts: Option<Vec<Contact>>,
}

/// Typed, cached access to the storefront endpoints.
///
/// Only successful responses are cached; `empty` results are returned but
/// fetched again next time.
pub struct Catalog {
    api: Arc<ApiClient>,
    cached: Mutex<Cached>,
}

impl Catalog {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api, cached: Mutex::new(Cached::default()) }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, Cached> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn latest_products(&self, page: u32) -> Result<Page<ProductsList>, ApiError> {
        if let Some(hit) = self.cache().latest.page(page) {
            return Ok(hit);
        }
        let uri = format!("/products/latest?page={page}");
        let fetched = self.fetch::<Page<_>>(&uri, CallName::Products, "products").await?;
        if let Some(fetched) = &fetched {
            self.cache().latest.store(page, fetched);
        }
        Ok(fetched.unwrap_or_else(empty_page))
    }

    /// First page of latest arrivals for the home page, never cached.
    pub async fn home_products(&self, per_page: u32) -> Result<Page<ProductsList>, ApiError> {
        let uri = format!("/products/latest?page=1&per_page={per_page}");
        Ok(self.fetch::<Page<_>>(&uri, CallName::Home, "home products").await?.unwrap_or_else(empty_page))
    }

    pub async fn product_detail(&self, id: u64) -> Result<Option<Product>, ApiError> {
        if let Some(hit) = self.cache().product_detail.get(&id) {
            return Ok(Some(hit.clone()));
        }
        let product: Option<Product> =
            self.fetch(&format!("/products/{id}"), CallName::ProductDetail, "product").await?;
        if let Some(product) = &product {
            self.cache().product_detail.insert(id, product.clone());
        }
        Ok(product)
    }

    /// A different query than last time throws away the cached result pages.
    pub async fn search(&self, query: &str, page: u32) -> Result<Page<ProductsList>, ApiError> {
        {
            let mut cached = self.cache();
            if cached.search_query.as_deref() != Some(query) {
                cached.search.clear();
                cached.search_query = Some(query.to_string());
            } else if let Some(hit) = cached.search.page(page) {
                return Ok(hit);
            }
        }
        let uri = search_uri(query, page);
        let fetched = self.fetch::<Page<_>>(&uri, CallName::Search, "search results").await?;
        if let Some(fetched) = &fetched {
            let mut cached = self.cache();
            if cached.search_query.as_deref() == Some(query) {
                cached.search.store(page, fetched);
            }
        }
        Ok(fetched.unwrap_or_else(empty_page))
    }

    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(hit) = &self.cache().categories {
            return Ok(hit.clone());
        }
        let categories: Vec<Category> =
            self.fetch("/categories", CallName::Categories, "categories").await?.unwrap_or_default();
        if !categories.is_empty() {
            self.cache().categories = Some(categories.clone());
        }
        Ok(categories)
    }

    pub async fn faqs(&self) -> Result<Vec<Faq>, ApiError> {
        if let Some(hit) = &self.cache().faqs {
            return Ok(hit.clone());
        }
        let faqs: Vec<Faq> = self.fetch("/faqs", CallName::Faqs, "faqs").await?.unwrap_or_default();
        if !faqs.is_empty() {
            self.cache().faqs = Some(faqs.clone());
        }
        Ok(faqs)
    }

    pub async fn contacts(&self) -> Result<Vec<Contact>, ApiError> {
        if let Some(hit) = &self.cache().contacts {
            return Ok(hit.clone());
        }
        let contacts: Vec<Contact> =
            self.fetch("/contacts", CallName::Contacts, "contacts").await?.unwrap_or_default();
        if !contacts.is_empty() {
            self.cache().contacts = Some(contacts.clone());
        }
        Ok(contacts)
    }

    pub async fn upcoming_shows(&self) -> Result<Vec<ShowCarousel>, ApiError> {
        if let Some(hit) = &self.cache().show_new {
            return Ok(hit.clone());
        }
        let shows: Vec<ShowCarousel> =
            self.fetch("/shows/next", CallName::ShowNew, "upcoming shows").await?.unwrap_or_default();
        if !shows.is_empty() {
            self.cache().show_new = Some(shows.clone());
        }
        Ok(shows)
    }

    pub async fn past_shows(&self, page: u32) -> Result<Page<ShowList>, ApiError> {
        if let Some(hit) = self.cache().show_old.page(page) {
            return Ok(hit);
        }
        let uri = format!("/shows/old?page={page}");
        let fetched = self.fetch::<Page<_>>(&uri, CallName::ShowOld, "past shows").await?;
        if let Some(fetched) = &fetched {
            self.cache().show_old.store(page, fetched);
        }
        Ok(fetched.unwrap_or_else(empty_page))
    }

    pub async fn show(&self, id: u64) -> Result<Option<Show>, ApiError> {
        self.fetch(&format!("/shows/{id}"), CallName::Show, "show").await
    }

    /// `Ok(None)` for empty results, `Ok(Some(_))` only for a decoded success.
    /// A success without a usable body is a server error.
    async fn fetch<T: DeserializeOwned>(
        &self,
        uri: &str,
        call: CallName,
        what: &'static str,
    ) -> Result<Option<T>, ApiError> {
        match self.api.dispatch(uri, call).await {
            Outcome::Completed { status: CallStatus::Success, data: Some(body), .. } => serde_json::from_value(body)
                .map(Some)
                .map_err(|source| ApiError::Decode { what, source }),
            Outcome::Completed { status: CallStatus::Empty, .. } => Ok(None),
            Outcome::Completed { http_status, status_text, .. } => {
                Err(ApiError::Server { status: http_status, text: status_text })
            }
            Outcome::Failed { message } => Err(ApiError::Transport(message)),
            Outcome::Canceled => Err(ApiError::Canceled),
        }
    }
}

fn empty_page<T>() -> Page<T> {
    Page { data: Vec::new(), total: 0 }
}

// Only used to percent-encode the query string.
static SEARCH_BASE: Lazy<Url> = Lazy::new(|| Url::parse("http://localhost/products/search").unwrap());

fn search_uri(query: &str, page: u32) -> String {
    let mut url = SEARCH_BASE.clone();
    url.query_pairs_mut().append_pair("text", query).append_pair("page", &page.to_string());
    format!("{}?{}", url.path(), url.query().unwrap_or_default())
}
