//! Application state.

use saucier_core::location::{self, DATABASE_PARAM, DeepLink};
use saucier_core::{Partition, Recipe, RecipeDetail};
use url::Url;

use crate::pagination;

/// Loaded recipes of one partition. Each partition owns its slot; loading
/// one never touches the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSlot {
    pub recipes: Vec<Recipe>,
    pub loading: bool,
    /// At least one load has finished (successfully or not).
    pub loaded: bool,
    pub error: Option<String>,
    /// Bumped whenever the slot is reset. A fetch result carries the
    /// generation it was started for and is dropped if that has changed.
    pub generation: u64,
    /// Generation of the fetch currently running, if any. Survives a reset
    /// so a new session never starts a second concurrent fetch.
    pub in_flight: Option<u64>,
}

impl PartitionSlot {
    pub(crate) fn reset(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            in_flight: self.in_flight,
            ..Self::default()
        };
    }
}

/// Open recipe detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub partition: Partition,
    /// The list-level recipe, shown while the children load.
    pub recipe: Recipe,
    pub detail: Option<RecipeDetail>,
    pub loading: bool,
    pub error: Option<String>,
}

impl DetailState {
    pub(crate) fn loading(partition: Partition, recipe: Recipe) -> Self {
        Self {
            partition,
            recipe,
            detail: None,
            loading: true,
            error: None,
        }
    }

    pub fn is_for(&self, partition: Partition, recipe_id: &str) -> bool {
        self.partition == partition && self.recipe.id == recipe_id
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub authenticated: bool,
    pub active: Partition,
    pub public: PartitionSlot,
    pub private: PartitionSlot,
    /// Location as last written to the history.
    pub location: Url,
    pub search: String,
    /// 1-based page of the filtered list of the active partition.
    pub current_page: usize,
    pub detail: Option<DetailState>,
    /// Deep link waiting for its lookup.
    pub deep_link: Option<DeepLink>,
    /// The startup location asked for the public partition explicitly.
    pub prefers_public: bool,
    /// The one automatic switch to the private partition has been used.
    pub auto_switched: bool,
    pub sign_in_error: Option<String>,
}

impl AppState {
    pub fn new(location: Url, authenticated: bool) -> Self {
        let prefers_public = location::query_value(&location, DATABASE_PARAM)
            .is_some_and(|value| value == Partition::Public.as_str());

        Self {
            authenticated,
            active: Partition::Public,
            public: PartitionSlot::default(),
            private: PartitionSlot::default(),
            location,
            search: String::new(),
            current_page: 1,
            detail: None,
            deep_link: None,
            prefers_public,
            auto_switched: false,
            sign_in_error: None,
        }
    }

    pub fn slot(&self, partition: Partition) -> &PartitionSlot {
        match partition {
            Partition::Public => &self.public,
            Partition::Private => &self.private,
        }
    }

    pub fn slot_mut(&mut self, partition: Partition) -> &mut PartitionSlot {
        match partition {
            Partition::Public => &mut self.public,
            Partition::Private => &mut self.private,
        }
    }

    /// Whether the partition can be shown at all. The private partition
    /// needs a session.
    pub fn is_available(&self, partition: Partition) -> bool {
        partition == Partition::Public || self.authenticated
    }

    /// Recipes of the active partition whose name contains the search text,
    /// ignoring case. An empty search matches everything.
    pub fn filtered_recipes(&self) -> Vec<&Recipe> {
        let needle = self.search.trim().to_lowercase();
        self.slot(self.active)
            .recipes
            .iter()
            .filter(|recipe| needle.is_empty() || recipe.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        pagination::total_pages(self.filtered_recipes().len())
    }

    /// Recipes on the current page.
    pub fn page_recipes(&self) -> Vec<&Recipe> {
        let filtered = self.filtered_recipes();
        let range = pagination::page_range(self.current_page, filtered.len());
        filtered[range].to_vec()
    }
}
