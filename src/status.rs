use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Loading,
    Success,
    Empty,
    Error,
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallStatus::Loading => "loading",
            CallStatus::Success => "success",
            CallStatus::Empty => "empty",
            CallStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// The API calls the storefront knows about. New endpoints need a new variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallName {
    #[serde(rename = "home")]
    Home,
    #[serde(rename = "categories")]
    Categories,
    #[serde(rename = "products")]
    Products,
    #[serde(rename = "product_detail")]
    ProductDetail,
    #[serde(rename = "faqs")]
    Faqs,
    #[serde(rename = "contacts")]
    Contacts,
    #[serde(rename = "search")]
    Search,
    #[serde(rename = "showO")]
    ShowOld,
    #[serde(rename = "showN")]
    ShowNew,
    #[serde(rename = "show")]
    Show,
}

impl CallName {
    pub const ALL: [CallName; 10] = [
        CallName::Home,
        CallName::Categories,
        CallName::Products,
        CallName::ProductDetail,
        CallName::Faqs,
        CallName::Contacts,
        CallName::Search,
        CallName::ShowOld,
        CallName::ShowNew,
        CallName::Show,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallName::Home => "home",
            CallName::Categories => "categories",
            CallName::Products => "products",
            CallName::ProductDetail => "product_detail",
            CallName::Faqs => "faqs",
            CallName::Contacts => "contacts",
            CallName::Search => "search",
            CallName::ShowOld => "showO",
            CallName::ShowNew => "showN",
            CallName::Show => "show",
        }
    }
}

impl fmt::Display for CallName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallName::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown call name '{s}'"))
    }
}

/// Per-call statuses plus the global one, which follows whichever call moved last.
pub struct StatusBoard {
    calls: Mutex<HashMap<CallName, CallStatus>>,
    global: watch::Sender<CallStatus>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        let calls = CallName::ALL.into_iter().map(|c| (c, CallStatus::Success)).collect();
        let (global, _) = watch::channel(CallStatus::Success);
        Self { calls: Mutex::new(calls), global }
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the per-call and the global status together.
    pub fn set(&self, call: CallName, status: CallStatus) {
        let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.insert(call, status);
        self.global.send_replace(status);
    }

    pub fn get(&self, call: CallName) -> CallStatus {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&call).copied().unwrap_or(CallStatus::Success)
    }

    pub fn global(&self) -> CallStatus {
        *self.global.borrow()
    }

    /// Receiver notified on every global status change.
    pub fn subscribe(&self) -> watch::Receiver<CallStatus> {
        self.global.subscribe()
    }

    pub fn snapshot(&self) -> Vec<(CallName, CallStatus)> {
        let calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
        CallName::ALL
            .into_iter()
            .map(|c| (c, calls.get(&c).copied().unwrap_or(CallStatus::Success)))
            .collect()
    }
}
