//! `saucier open` and `saucier show`

use anyhow::{Context, Result, bail};
use saucier_app::AppRuntime;
use saucier_core::Partition;
use saucier_core::config::CloudKitSettings;
use saucier_core::location::{DeepLink, History};
use url::Url;

use super::{boot, load_settings, render, settle};

pub async fn run(location: &str) -> Result<()> {
    let (_, settings) = load_settings()?;
    let runtime = open_at(settings, location).await?;

    match runtime.view().detail {
        Some(detail) => print!("{}", render::detail(&detail)),
        None => println!("No recipe open."),
    }
    println!("\nLocation: {}", runtime.history().location());
    Ok(())
}

pub async fn show(recipe_id: &str, partition: Partition) -> Result<()> {
    let (config, settings) = load_settings()?;
    let base = Url::parse(&config.app.location)
        .with_context(|| format!("Invalid app.location: {}", config.app.location))?;
    let link = DeepLink {
        recipe_id: recipe_id.to_string(),
        partition,
    };

    let runtime = open_at(settings, link.apply_to(&base).as_str()).await?;
    let Some(detail) = runtime.view().detail else {
        bail!("Recipe {recipe_id} not found in {}", partition.label());
    };
    print!("{}", render::detail(&detail));
    Ok(())
}

async fn open_at(settings: CloudKitSettings, location: &str) -> Result<AppRuntime> {
    let mut runtime = boot(settings, location)?;
    runtime.start();
    settle(&mut runtime).await?;
    Ok(runtime)
}
