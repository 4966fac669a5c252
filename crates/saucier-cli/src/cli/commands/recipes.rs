//! `saucier recipes`

use anyhow::Result;
use saucier_app::UiEvent;
use saucier_core::Partition;

use super::{boot, load_settings, render, settle};

pub struct RecipesOptions<'a> {
    pub database: Option<Partition>,
    pub search: Option<&'a str>,
    pub page: usize,
}

pub async fn run(options: RecipesOptions<'_>) -> Result<()> {
    let (config, settings) = load_settings()?;
    let mut runtime = boot(settings, &config.app.location)?;

    runtime.start();
    settle(&mut runtime).await?;

    if let Some(partition) = options.database {
        runtime.dispatch(UiEvent::TabSelected(partition));
    }
    if let Some(search) = options.search {
        runtime.dispatch(UiEvent::SearchChanged(search.to_string()));
    }
    if options.page != 1 {
        runtime.dispatch(UiEvent::PageRequested(options.page));
    }
    settle(&mut runtime).await?;

    let state = runtime.state();
    if state.current_page != options.page && state.total_pages() > 0 {
        eprintln!(
            "Page {} is out of range (1-{}), showing page {}.",
            options.page,
            state.total_pages(),
            state.current_page
        );
    }

    print!("{}", render::list(&runtime.view()));
    Ok(())
}
