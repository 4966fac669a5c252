//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover fetches, history updates and the sign-in navigation.

use saucier_core::location::DeepLink;
use saucier_core::{Partition, Recipe};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Fetch every recipe of a partition for the given slot generation.
    LoadRecipes { partition: Partition, generation: u64 },

    /// Look up the deep-linked recipe.
    LookupRecipe { link: DeepLink },

    /// Fetch ingredients, instructions and images of an open recipe.
    LoadDetail { partition: Partition, recipe: Recipe },

    /// Replace the current history entry.
    ReplaceLocation { url: Url },

    /// Add a history entry.
    PushLocation { url: Url },

    /// Leave for the external sign-in page.
    BeginSignIn,
}
