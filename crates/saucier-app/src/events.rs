//! UI events.
//!
//! Everything that can change [`AppState`](crate::AppState) arrives as a
//! `UiEvent`: user intents, auth transitions and completed fetches.

use saucier_core::location::DeepLink;
use saucier_core::{CloudKitError, Partition, Recipe, RecipeDetail};

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// The app booted at the current location.
    Started,
    /// The session switched between logged out and logged in.
    AuthChanged(bool),
    TabSelected(Partition),
    SearchChanged(String),
    PageRequested(usize),
    /// The user opened a recipe from a list.
    RecipeOpened {
        partition: Partition,
        recipe_id: String,
    },
    DetailClosed,
    SignInRequested,
    SignInFailed(String),

    RecipesLoaded {
        partition: Partition,
        generation: u64,
        result: Result<Vec<Recipe>, CloudKitError>,
    },
    DeepLinkResolved {
        link: DeepLink,
        result: Result<Option<Recipe>, CloudKitError>,
    },
    DetailLoaded {
        partition: Partition,
        recipe_id: String,
        result: Result<RecipeDetail, CloudKitError>,
    },
}

impl UiEvent {
    /// Events that finish a spawned fetch.
    pub fn is_completion(&self) -> bool {
        matches!(
            self,
            UiEvent::RecipesLoaded { .. }
                | UiEvent::DeepLinkResolved { .. }
                | UiEvent::DetailLoaded { .. }
        )
    }
}
