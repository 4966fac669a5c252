//! Reducer.
//!
//! All state mutations happen here. The runtime calls `update(state, event)`
//! and executes the returned effects.

use saucier_core::location::{self, DEEP_LINK_PARAMS, DeepLink};
use saucier_core::{CloudKitError, Partition, Recipe, RecipeDetail};

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::pagination;
use crate::state::{AppState, DetailState};

pub fn update(state: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Started => handle_started(state),
        UiEvent::AuthChanged(authenticated) => handle_auth_changed(state, authenticated),
        UiEvent::TabSelected(partition) => handle_tab_selected(state, partition),
        UiEvent::SearchChanged(search) => {
            state.search = search;
            state.current_page = 1;
            vec![]
        }
        UiEvent::PageRequested(page) => {
            if (1..=state.total_pages()).contains(&page) {
                state.current_page = page;
            }
            vec![]
        }
        UiEvent::RecipeOpened {
            partition,
            recipe_id,
        } => handle_recipe_opened(state, partition, &recipe_id),
        UiEvent::DetailClosed => handle_detail_closed(state),
        UiEvent::SignInRequested => {
            if state.authenticated {
                return vec![];
            }
            state.sign_in_error = None;
            vec![UiEffect::BeginSignIn]
        }
        UiEvent::SignInFailed(message) => {
            tracing::error!("sign-in failed: {message}");
            state.sign_in_error = Some(message);
            vec![]
        }
        UiEvent::RecipesLoaded {
            partition,
            generation,
            result,
        } => handle_recipes_loaded(state, partition, generation, result),
        UiEvent::DeepLinkResolved { link, result } => handle_deep_link_resolved(state, link, result),
        UiEvent::DetailLoaded {
            partition,
            recipe_id,
            result,
        } => {
            handle_detail_loaded(state, partition, &recipe_id, result);
            vec![]
        }
    }
}

fn handle_started(state: &mut AppState) -> Vec<UiEffect> {
    let mut effects = Vec::new();

    if let Some(link) = DeepLink::from_url(&state.location) {
        if state.is_available(link.partition) {
            tracing::info!(recipe_id = %link.recipe_id, partition = %link.partition, "resolving deep link");
            state.active = link.partition;
            state.deep_link = Some(link.clone());
            effects.push(UiEffect::LookupRecipe { link });
        } else {
            tracing::info!(recipe_id = %link.recipe_id, partition = %link.partition, "deep link needs a session, dropping it");
            effects.extend(strip_deep_link(state));
        }
    }

    effects.extend(request_load(state, Partition::Public));
    if state.authenticated {
        effects.extend(on_logged_in(state));
    }
    effects
}

fn handle_auth_changed(state: &mut AppState, authenticated: bool) -> Vec<UiEffect> {
    if state.authenticated == authenticated {
        return vec![];
    }
    state.authenticated = authenticated;

    if authenticated {
        tracing::info!("signed in");
        state.sign_in_error = None;
        return on_logged_in(state);
    }

    tracing::info!("signed out");
    state.private.reset();
    if state.active == Partition::Private {
        state.active = Partition::Public;
        state.current_page = 1;
    }
    vec![]
}

/// Loads the private partition and takes the one automatic switch to it.
fn on_logged_in(state: &mut AppState) -> Vec<UiEffect> {
    if !state.auto_switched && !state.prefers_public {
        state.auto_switched = true;
        if state.active != Partition::Private {
            state.active = Partition::Private;
            state.current_page = 1;
        }
    }
    request_load(state, Partition::Private).into_iter().collect()
}

/// Starts a load unless a fetch is already running for the partition.
///
/// A fetch left over from before a reset is not reused: the slot stays
/// loading and the load is issued once that fetch reports back.
fn request_load(state: &mut AppState, partition: Partition) -> Option<UiEffect> {
    if !state.is_available(partition) {
        return None;
    }
    let slot = state.slot_mut(partition);
    slot.loading = true;
    slot.error = None;
    match slot.in_flight {
        Some(generation) if generation == slot.generation => {
            tracing::debug!(%partition, "load already in flight");
            None
        }
        Some(_) => {
            tracing::debug!(%partition, "waiting for an outdated load to finish");
            None
        }
        None => {
            slot.in_flight = Some(slot.generation);
            Some(UiEffect::LoadRecipes {
                partition,
                generation: slot.generation,
            })
        }
    }
}

fn handle_tab_selected(state: &mut AppState, partition: Partition) -> Vec<UiEffect> {
    if state.active != partition {
        state.active = partition;
        state.current_page = 1;
    }
    if !state.is_available(partition) {
        tracing::debug!(%partition, "partition needs a session, not loading");
        return vec![];
    }

    // Retry a failed or never-started load on revisit.
    let slot = state.slot(partition);
    if slot.loaded && slot.error.is_none() {
        return vec![];
    }
    request_load(state, partition).into_iter().collect()
}

fn handle_recipes_loaded(
    state: &mut AppState,
    partition: Partition,
    generation: u64,
    result: Result<Vec<Recipe>, CloudKitError>,
) -> Vec<UiEffect> {
    let slot = state.slot_mut(partition);
    if slot.in_flight == Some(generation) {
        slot.in_flight = None;
    }
    if slot.generation != generation {
        tracing::debug!(%partition, generation, "dropping recipes loaded for an outdated session");
        if !slot.loading {
            return vec![];
        }
        return request_load(state, partition).into_iter().collect();
    }

    slot.loading = false;
    slot.loaded = true;
    match result {
        Ok(recipes) => {
            tracing::debug!(%partition, count = recipes.len(), "recipes loaded");
            slot.recipes = recipes;
            slot.error = None;
        }
        Err(err) => {
            tracing::error!(%partition, "failed to load recipes: {err}");
            slot.recipes.clear();
            slot.error = Some(err.to_string());
        }
    }

    if partition == state.active {
        state.current_page = pagination::clamp_page(state.current_page, state.total_pages());
    }
    vec![]
}

fn handle_deep_link_resolved(
    state: &mut AppState,
    link: DeepLink,
    result: Result<Option<Recipe>, CloudKitError>,
) -> Vec<UiEffect> {
    if state.deep_link.as_ref() != Some(&link) {
        tracing::debug!(recipe_id = %link.recipe_id, "ignoring stale deep link result");
        return vec![];
    }
    state.deep_link = None;

    match result {
        Ok(Some(recipe)) => {
            tracing::info!(recipe_id = %recipe.id, partition = %link.partition, "opening deep-linked recipe");
            if state.active != link.partition {
                state.active = link.partition;
                state.current_page = 1;
            }
            state.detail = Some(DetailState::loading(link.partition, recipe.clone()));
            vec![UiEffect::LoadDetail {
                partition: link.partition,
                recipe,
            }]
        }
        Ok(None) => {
            tracing::info!(recipe_id = %link.recipe_id, partition = %link.partition, "deep-linked recipe not found");
            strip_deep_link(state)
        }
        Err(err) => {
            tracing::error!(recipe_id = %link.recipe_id, "deep link lookup failed: {err}");
            strip_deep_link(state)
        }
    }
}

fn strip_deep_link(state: &mut AppState) -> Vec<UiEffect> {
    let url = location::without_params(&state.location, &DEEP_LINK_PARAMS);
    state.location = url.clone();
    vec![UiEffect::ReplaceLocation { url }]
}

fn handle_recipe_opened(
    state: &mut AppState,
    partition: Partition,
    recipe_id: &str,
) -> Vec<UiEffect> {
    let Some(recipe) = state
        .slot(partition)
        .recipes
        .iter()
        .find(|recipe| recipe.id == recipe_id)
        .cloned()
    else {
        tracing::warn!(%partition, recipe_id, "cannot open a recipe that is not loaded");
        return vec![];
    };

    let link = DeepLink {
        recipe_id: recipe.id.clone(),
        partition,
    };
    let url = link.apply_to(&state.location);
    state.location = url.clone();
    state.deep_link = None;
    state.detail = Some(DetailState::loading(partition, recipe.clone()));

    vec![
        UiEffect::PushLocation { url },
        UiEffect::LoadDetail { partition, recipe },
    ]
}

fn handle_detail_loaded(
    state: &mut AppState,
    partition: Partition,
    recipe_id: &str,
    result: Result<RecipeDetail, CloudKitError>,
) {
    let Some(detail) = state
        .detail
        .as_mut()
        .filter(|detail| detail.is_for(partition, recipe_id))
    else {
        tracing::debug!(recipe_id, "ignoring detail for a recipe that is no longer open");
        return;
    };

    detail.loading = false;
    match result {
        Ok(loaded) => {
            detail.detail = Some(loaded);
            detail.error = None;
        }
        Err(err) => {
            tracing::error!(recipe_id, "failed to load recipe detail: {err}");
            detail.error = Some(err.to_string());
        }
    }
}

fn handle_detail_closed(state: &mut AppState) -> Vec<UiEffect> {
    state.detail = None;
    state.deep_link = None;

    if !DEEP_LINK_PARAMS
        .iter()
        .any(|name| location::has_param(&state.location, name))
    {
        return vec![];
    }
    let url = location::without_params(&state.location, &DEEP_LINK_PARAMS);
    state.location = url.clone();
    vec![UiEffect::PushLocation { url }]
}
