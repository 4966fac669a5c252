//! View model consumed by the presentation layer.

use saucier_core::Partition;

use crate::pagination::{self, PageItem};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppView {
    /// Visible tabs. The private tab is hidden while signed out.
    pub tabs: Vec<Tab>,
    pub authenticated: bool,
    pub search: String,
    pub list: ListView,
    pub detail: Option<DetailView>,
    pub sign_in_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub partition: Partition,
    pub label: &'static str,
    pub active: bool,
}

/// What the active partition shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Loading,
    SignInRequired,
    Empty { message: String },
    Page(PageView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub partition: Partition,
    pub rows: Vec<RecipeRow>,
    pub current_page: usize,
    pub total_pages: usize,
    pub pages: Vec<PageItem>,
    /// First item, last item, filtered total.
    pub showing: (usize, usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRow {
    pub id: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub partition: Partition,
    pub recipe_id: String,
    pub name: String,
    pub url: Option<String>,
    pub loading: bool,
    pub error: Option<String>,
    pub ingredients: Vec<String>,
    /// Steps in display order.
    pub instructions: Vec<String>,
    /// `data:` URI of the cover image.
    pub image: Option<String>,
}

pub fn view(state: &AppState) -> AppView {
    let tabs = Partition::ALL
        .into_iter()
        .filter(|partition| state.is_available(*partition))
        .map(|partition| Tab {
            partition,
            label: partition.label(),
            active: partition == state.active,
        })
        .collect();

    AppView {
        tabs,
        authenticated: state.authenticated,
        search: state.search.clone(),
        list: list_view(state),
        detail: detail_view(state),
        sign_in_error: state.sign_in_error.clone(),
    }
}

fn list_view(state: &AppState) -> ListView {
    let partition = state.active;
    if !state.is_available(partition) {
        return ListView::SignInRequired;
    }

    let slot = state.slot(partition);
    if (slot.loading && slot.recipes.is_empty()) || (!slot.loaded && !slot.loading) {
        return ListView::Loading;
    }
    if slot.error.is_some() {
        return ListView::Empty {
            message: format!("Couldn't load {}. Try again later.", partition.label()),
        };
    }

    let filtered = state.filtered_recipes();
    if filtered.is_empty() {
        let message = if state.search.trim().is_empty() {
            empty_message(partition).to_string()
        } else {
            format!("No recipes match \"{}\".", state.search.trim())
        };
        return ListView::Empty { message };
    }

    let count = filtered.len();
    let total_pages = pagination::total_pages(count);
    let current_page = pagination::clamp_page(state.current_page, total_pages);
    let rows = filtered[pagination::page_range(current_page, count)]
        .iter()
        .map(|recipe| RecipeRow {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            url: recipe.url.clone(),
        })
        .collect();

    ListView::Page(PageView {
        partition,
        rows,
        current_page,
        total_pages,
        pages: pagination::page_numbers(current_page, total_pages),
        showing: pagination::showing(current_page, count).unwrap_or((0, 0, count)),
    })
}

fn empty_message(partition: Partition) -> &'static str {
    match partition {
        Partition::Private => "You haven't saved any recipes yet.",
        Partition::Public => "No public recipes yet.",
    }
}

fn detail_view(state: &AppState) -> Option<DetailView> {
    let open = state.detail.as_ref()?;
    let recipe = open
        .detail
        .as_ref()
        .map_or(&open.recipe, |detail| &detail.recipe);

    let (ingredients, instructions, image) = match &open.detail {
        Some(detail) => (
            detail
                .ingredients()
                .iter()
                .map(|ingredient| ingredient.raw_value.clone())
                .collect(),
            detail
                .instructions()
                .iter()
                .map(|step| step.raw_value.clone())
                .collect(),
            detail.cover_image().and_then(|image| image.data_uri()),
        ),
        None => (Vec::new(), Vec::new(), None),
    };

    Some(DetailView {
        partition: open.partition,
        recipe_id: recipe.id.clone(),
        name: recipe.name.clone(),
        url: recipe.url.clone(),
        loading: open.loading,
        error: open.error.clone(),
        ingredients,
        instructions,
        image,
    })
}

#[cfg(test)]
mod tests {
    use saucier_core::{Ingredient, Instruction, Recipe, RecipeDetail, RecipeImage};
    use url::Url;

    use super::*;
    use crate::state::DetailState;

    fn recipe(id: &str, name: &str) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: name.to_string(),
            url: None,
            created_at: None,
            ingredients: None,
            instructions: None,
        }
    }

    fn loaded_state(authenticated: bool, count: usize) -> AppState {
        let mut state = AppState::new(Url::parse("https://app.test/").unwrap(), authenticated);
        state.public.recipes = (0..count)
            .map(|i| recipe(&format!("r{i}"), &format!("Dish {i}")))
            .collect();
        state.public.loaded = true;
        state
    }

    #[test]
    fn test_private_tab_hidden_when_signed_out() {
        let signed_out = view(&loaded_state(false, 1));
        assert_eq!(signed_out.tabs.len(), 1);
        assert_eq!(signed_out.tabs[0].label, "Public Recipes");

        let signed_in = view(&loaded_state(true, 1));
        let labels: Vec<&str> = signed_in.tabs.iter().map(|t| t.label).collect();
        assert_eq!(labels, ["My Recipes", "Public Recipes"]);
    }

    #[test]
    fn test_list_states() {
        let mut state = AppState::new(Url::parse("https://app.test/").unwrap(), false);
        assert_eq!(view(&state).list, ListView::Loading);

        state.public.loaded = true;
        assert_eq!(
            view(&state).list,
            ListView::Empty {
                message: "No public recipes yet.".to_string()
            }
        );

        state.public.error = Some("HTTP 500".to_string());
        assert!(matches!(view(&state).list, ListView::Empty { message } if message.contains("Public Recipes")));

        state.active = Partition::Private;
        assert_eq!(view(&state).list, ListView::SignInRequired);
    }

    #[test]
    fn test_page_view() {
        let mut state = loaded_state(false, 45);
        state.current_page = 2;

        let ListView::Page(page) = view(&state).list else {
            panic!("expected a page");
        };
        assert_eq!(page.rows.len(), 20);
        assert_eq!(page.rows[0].id, "r20");
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.showing, (21, 40, 45));
    }

    #[test]
    fn test_no_search_match_message() {
        let mut state = loaded_state(false, 3);
        state.search = "pizza".to_string();
        assert_eq!(
            view(&state).list,
            ListView::Empty {
                message: "No recipes match \"pizza\".".to_string()
            }
        );
    }

    #[test]
    fn test_detail_view_uses_loaded_children() {
        let mut state = loaded_state(false, 1);
        let base = recipe("r0", "Dish 0");
        let detail = RecipeDetail {
            recipe: base.with_details(
                vec![Ingredient {
                    id: "i".to_string(),
                    raw_value: "1 onion".to_string(),
                }],
                vec![Instruction {
                    id: "s".to_string(),
                    raw_value: "Chop".to_string(),
                    index: 0,
                }],
            ),
            images: vec![RecipeImage {
                id: "img".to_string(),
                data: Some(b"jpg".to_vec()),
            }],
        };
        let mut open = DetailState::loading(Partition::Public, base);
        open.loading = false;
        open.detail = Some(detail);
        state.detail = Some(open);

        let shown = view(&state).detail.unwrap();
        assert_eq!(shown.ingredients, ["1 onion"]);
        assert_eq!(shown.instructions, ["Chop"]);
        assert_eq!(shown.image.as_deref(), Some("data:image/jpeg;base64,anBn"));
    }
}
