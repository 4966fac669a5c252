//! Plain-text rendering of the app view.

use std::fmt::Write as _;

use saucier_app::AppView;
use saucier_app::pagination::PageItem;
use saucier_app::view::{DetailView, ListView, PageView};

pub fn list(view: &AppView) -> String {
    let mut out = String::new();

    let tabs: Vec<String> = view
        .tabs
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.label)
            } else {
                tab.label.to_string()
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join("  "));
    if !view.search.trim().is_empty() {
        let _ = writeln!(out, "Search: {}", view.search.trim());
    }
    out.push('\n');

    match &view.list {
        ListView::Loading => out.push_str("Loading recipes...\n"),
        ListView::SignInRequired => {
            out.push_str("Sign in to see your recipes. Run `saucier login`.\n");
        }
        ListView::Empty { message } => {
            let _ = writeln!(out, "{message}");
        }
        ListView::Page(page) => page_body(&mut out, page),
    }
    out
}

fn page_body(out: &mut String, page: &PageView) {
    let first = page.showing.0;
    for (offset, row) in page.rows.iter().enumerate() {
        let _ = write!(out, "{:>4}. {}  ({})", first + offset, row.name, row.id);
        if let Some(url) = &row.url {
            let _ = write!(out, "  {url}");
        }
        out.push('\n');
    }

    let (start, end, total) = page.showing;
    let _ = writeln!(out, "\nShowing {start} to {end} of {total} results");
    if page.total_pages > 1 {
        let pages: Vec<String> = page
            .pages
            .iter()
            .map(|item| match item {
                PageItem::Page(number) if *number == page.current_page => format!("[{number}]"),
                PageItem::Page(number) => number.to_string(),
                PageItem::Gap => "...".to_string(),
            })
            .collect();
        let _ = writeln!(out, "Pages: {}", pages.join(" "));
    }
}

pub fn detail(detail: &DetailView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", detail.name);
    let _ = writeln!(out, "id: {}  ({})", detail.recipe_id, detail.partition.label());
    if let Some(url) = &detail.url {
        let _ = writeln!(out, "source: {url}");
    }
    if detail.image.is_some() {
        out.push_str("image: yes\n");
    }

    if detail.loading {
        out.push_str("\nLoading details...\n");
        return out;
    }
    if let Some(error) = &detail.error {
        let _ = writeln!(out, "\nCouldn't load details: {error}");
        return out;
    }

    out.push_str("\nIngredients\n");
    if detail.ingredients.is_empty() {
        out.push_str("  (none)\n");
    }
    for ingredient in &detail.ingredients {
        let _ = writeln!(out, "  - {ingredient}");
    }

    out.push_str("\nInstructions\n");
    if detail.instructions.is_empty() {
        out.push_str("  (none)\n");
    }
    for (step, instruction) in detail.instructions.iter().enumerate() {
        let _ = writeln!(out, "  {}. {instruction}", step + 1);
    }
    out
}

#[cfg(test)]
mod tests {
    use saucier_app::view::{RecipeRow, Tab};
    use saucier_core::Partition;

    use super::*;

    fn view(list: ListView) -> AppView {
        AppView {
            tabs: vec![Tab {
                partition: Partition::Public,
                label: "Public Recipes",
                active: true,
            }],
            authenticated: false,
            search: String::new(),
            list,
            detail: None,
            sign_in_error: None,
        }
    }

    #[test]
    fn test_list_renders_rows_and_summary() {
        let page = PageView {
            partition: Partition::Public,
            rows: vec![RecipeRow {
                id: "r21".to_string(),
                name: "Chili".to_string(),
                url: None,
            }],
            current_page: 2,
            total_pages: 2,
            pages: vec![PageItem::Page(1), PageItem::Page(2)],
            showing: (21, 21, 21),
        };
        let out = list(&view(ListView::Page(page)));

        assert!(out.starts_with("[Public Recipes]"));
        assert!(out.contains("  21. Chili  (r21)"));
        assert!(out.contains("Showing 21 to 21 of 21 results"));
        assert!(out.contains("Pages: 1 [2]"));
    }

    #[test]
    fn test_list_renders_empty_message() {
        let out = list(&view(ListView::Empty {
            message: "No public recipes yet.".to_string(),
        }));
        assert!(out.contains("No public recipes yet."));
    }

    #[test]
    fn test_detail_numbers_steps() {
        let out = detail(&DetailView {
            partition: Partition::Private,
            recipe_id: "r1".to_string(),
            name: "Soup".to_string(),
            url: None,
            loading: false,
            error: None,
            ingredients: vec!["1 onion".to_string()],
            instructions: vec!["Chop".to_string(), "Simmer".to_string()],
            image: None,
        });
        assert!(out.contains("  - 1 onion"));
        assert!(out.contains("  1. Chop\n  2. Simmer"));
        assert!(out.contains("(My Recipes)"));
    }
}
