//! Effect handlers.
//!
//! Pure async functions that talk to the record store and return the
//! completion event. The runtime spawns them and sends the result to the
//! inbox; they never touch state.

use saucier_core::location::DeepLink;
use saucier_core::{CloudKitClient, Partition, Recipe};

use crate::events::UiEvent;

pub async fn load_recipes(client: CloudKitClient, partition: Partition, generation: u64) -> UiEvent {
    let result = client.fetch_recipes(partition).await;
    UiEvent::RecipesLoaded {
        partition,
        generation,
        result,
    }
}

pub async fn lookup_recipe(client: CloudKitClient, link: DeepLink) -> UiEvent {
    let result = client
        .fetch_recipe_by_id(link.partition, &link.recipe_id)
        .await;
    UiEvent::DeepLinkResolved { link, result }
}

pub async fn load_detail(client: CloudKitClient, partition: Partition, recipe: Recipe) -> UiEvent {
    let result = client.fetch_recipe_detail(partition, &recipe).await;
    UiEvent::DetailLoaded {
        partition,
        recipe_id: recipe.id,
        result,
    }
}
