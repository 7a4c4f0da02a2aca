//! Three-level category trail for product browsing.
//!
//! Level 0 is the top category, level 1 the subcategory, level 2 the
//! sub-subcategory. Choosing a shallower level clears everything below it.
//! The trail is written to session storage after every change and read back
//! when the store is built, so a reload within the session keeps the path.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::storage::{BREADCRUMBS_KEY, KeyValueStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub lvl: u8,
    pub label_ita: String,
    pub label_eng: String,
    #[serde(rename = "expandedIndex")]
    pub expanded_index: Option<i64>,
    pub parent_index: Option<i64>,
}

impl Breadcrumb {
    fn empty(lvl: u8) -> Self {
        Self {
            lvl,
            label_ita: String::new(),
            label_eng: String::new(),
            expanded_index: None,
            parent_index: None,
        }
    }

    pub fn is_populated(&self) -> bool {
        self.expanded_index.is_some()
    }
}

pub type Trail = [Breadcrumb; 3];

/// `Ultimi Arrivi` / `Latest Arrivals` at the top, nothing below.
pub fn default_trail() -> Trail {
    [
        Breadcrumb {
            lvl: 0,
            label_ita: "Ultimi Arrivi".to_string(),
            label_eng: "Latest Arrivals".to_string(),
            expanded_index: None,
            parent_index: None,
        },
        Breadcrumb::empty(1),
        Breadcrumb::empty(2),
    ]
}

pub struct BreadcrumbStore {
    trail: Trail,
    session: Arc<dyn KeyValueStore>,
}

impl BreadcrumbStore {
    /// Rehydrates from session storage, or starts from the default trail.
    pub fn new(session: Arc<dyn KeyValueStore>) -> Self {
        let trail = read_trail(session.as_ref());
        Self { trail, session }
    }

    pub fn breadcrumbs(&self) -> &Trail {
        &self.trail
    }

    pub fn expanded_category_index(&self) -> Option<i64> {
        self.trail[0].expanded_index
    }

    pub fn expanded_inner_category_index(&self) -> Option<i64> {
        self.trail[1].expanded_index
    }

    pub fn sub_category_index(&self) -> Option<i64> {
        self.trail[2].expanded_index
    }

    /// The slots a breadcrumb bar shows: the top one, then each deeper
    /// level for as long as it has a selection.
    pub fn path(&self) -> impl Iterator<Item = &Breadcrumb> {
        std::iter::once(&self.trail[0]).chain(self.trail[1..].iter().take_while(|crumb| crumb.is_populated()))
    }

    pub fn set_breadcrumb(
        &mut self,
        level: u8,
        label_ita: &str,
        label_eng: &str,
        id: Option<i64>,
        parent: Option<i64>,
    ) {
        let item = Breadcrumb {
            lvl: level,
            label_ita: label_ita.to_string(),
            label_eng: label_eng.to_string(),
            expanded_index: id,
            parent_index: parent,
        };
        match level {
            0 => {
                self.trail[0] = item;
                self.trail[1] = Breadcrumb::empty(1);
                self.trail[2] = Breadcrumb::empty(2);
            }
            1 => {
                self.trail[1] = item;
                self.trail[2] = Breadcrumb::empty(2);
            }
            _ => self.trail[2] = item,
        }
        tracing::debug!(level, ?id, ?parent, "breadcrumb set");
        self.save_session_data();
    }

    pub fn reset_breadcrumbs(&mut self) {
        self.trail = default_trail();
        tracing::debug!("breadcrumbs reset");
        self.save_session_data();
    }

    pub fn save_session_data(&self) {
        match serde_json::to_string(&self.trail) {
            Ok(json) => self.session.set(BREADCRUMBS_KEY, &json),
            Err(e) => tracing::warn!(error = %e, "could not serialize breadcrumbs"),
        }
    }

    pub fn load_session_data(&mut self) {
        self.trail = read_trail(self.session.as_ref());
    }
}

fn read_trail(session: &dyn KeyValueStore) -> Trail {
    let Some(raw) = session.get(BREADCRUMBS_KEY) else {
        return default_trail();
    };
    // Exactly three slots or it's treated as absent.
    match serde_json::from_str::<Trail>(&raw) {
        Ok(trail) => trail,
        Err(e) => {
            tracing::debug!(error = %e, "stored breadcrumbs unreadable, using defaults");
            default_trail()
        }
    }
}
