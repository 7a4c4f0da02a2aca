//! Payloads returned by the public API.

use serde::{Deserialize, Serialize};

use crate::breadcrumbs::Breadcrumb;
use crate::session::Language;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub description_ita: Option<String>,
    pub description_eng: Option<String>,
    #[serde(default)]
    pub sub_categories: Vec<Category>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub description_ita: Option<String>,
    pub description_eng: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub link_value: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    pub id: u64,
    pub question_ita: String,
    pub question_eng: String,
    pub answer_ita: String,
    pub answer_eng: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub price: f64,
    pub image_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub deleting: bool,
    pub code: Option<String>,
    pub condition: Option<Condition>,
    pub description_eng: Option<String>,
    pub description_ita: Option<String>,
    pub images_url: Option<Vec<String>>,
    #[serde(default)]
    pub quantity: u32,
    pub year: Option<String>,
    pub category: Option<Vec<Category>>,
    pub manufacturer: Option<String>,
}

/// A product as it appears in listings and search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductsList {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub description_ita: String,
    pub description_eng: String,
    pub start_date: String,
    pub link: String,
    pub location: String,
    pub end_date: Option<String>,
    pub image_url: Option<String>,
    pub images_url: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowCarousel {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub image_url: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub link: Option<String>,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowList {
    pub id: u64,
    pub label_ita: String,
    pub label_eng: String,
    pub link: Option<String>,
    pub image_url: Option<String>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub location: String,
}

/// Paginated envelope: `{ "data": [...], "total": n }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub total: u64,
}

/// Anything carrying an Italian and an English label.
pub trait Labelled {
    fn label_ita(&self) -> &str;
    fn label_eng(&self) -> &str;

    fn label(&self, lang: Language) -> &str {
        match lang {
            Language::Ita => self.label_ita(),
            Language::Eng => self.label_eng(),
        }
    }
}

macro_rules! labelled {
    ($($ty:ty),* $(,)?) => {
        $(impl Labelled for $ty {
            fn label_ita(&self) -> &str { &self.label_ita }
            fn label_eng(&self) -> &str { &self.label_eng }
        })*
    };
}

labelled!(Breadcrumb, Category, Condition, Contact, Product, ProductsList, Show, ShowCarousel, ShowList);
