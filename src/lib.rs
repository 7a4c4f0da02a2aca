//! Client core for the storefront's public API.
//!
//! [`api::ApiClient`] issues requests through a per-key
//! [`tracker::RequestTracker`] so a repeated call cancels the one still in
//! flight, and records per-call status on a [`status::StatusBoard`].
//! [`breadcrumbs::BreadcrumbStore`] keeps the category drill-down path in
//! session storage, and [`router::Router`] resets it when the product list is
//! entered fresh.

pub mod api;
pub mod breadcrumbs;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod network;
pub mod router;
pub mod session;
pub mod status;
pub mod storage;
pub mod tracker;
pub mod utils;
