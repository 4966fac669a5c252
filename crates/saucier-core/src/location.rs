//! Location, history and navigation contract.
//!
//! The app reads its state from a location URL (`recipeId`, `database`,
//! `ckWebAuthToken`, `ckSession`) and writes it back through a [`History`]
//! without navigating. Full navigations (the sign-in redirect) go through a
//! [`Navigator`].

use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use url::Url;

use crate::partition::Partition;

pub const RECIPE_ID_PARAM: &str = "recipeId";
pub const DATABASE_PARAM: &str = "database";
pub const WEB_AUTH_TOKEN_PARAM: &str = "ckWebAuthToken";
pub const SESSION_PARAM: &str = "ckSession";

/// Parameters delivered by the sign-in redirect. Consumed once, never kept.
pub const AUTH_CALLBACK_PARAMS: [&str; 2] = [WEB_AUTH_TOKEN_PARAM, SESSION_PARAM];

/// Parameters describing an open recipe.
pub const DEEP_LINK_PARAMS: [&str; 2] = [RECIPE_ID_PARAM, DATABASE_PARAM];

/// Returns the first value of a query parameter.
pub fn query_value(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub fn has_param(url: &Url, name: &str) -> bool {
    url.query_pairs().any(|(key, _)| key == name)
}

/// Returns `url` with every occurrence of `names` removed, other parameters
/// kept in order.
pub fn without_params(url: &Url, names: &[&str]) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !names.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut stripped = url.clone();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }
    stripped
}

/// Returns `url` with each `(name, value)` set, replacing existing values.
pub fn with_params(url: &Url, params: &[(&str, &str)]) -> Url {
    let names: Vec<&str> = params.iter().map(|(name, _)| *name).collect();
    let mut updated = without_params(url, &names);
    updated.query_pairs_mut().extend_pairs(params);
    updated
}

/// Request to open one record directly on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub recipe_id: String,
    pub partition: Partition,
}

impl DeepLink {
    /// Reads a deep link from the location. Both `recipeId` and a valid
    /// `database` must be present.
    pub fn from_url(url: &Url) -> Option<Self> {
        let recipe_id = query_value(url, RECIPE_ID_PARAM).filter(|id| !id.trim().is_empty())?;
        let partition = query_value(url, DATABASE_PARAM)?.parse().ok()?;
        Some(Self {
            recipe_id,
            partition,
        })
    }

    /// Returns `base` pointing at this record.
    pub fn apply_to(&self, base: &Url) -> Url {
        with_params(
            base,
            &[
                (RECIPE_ID_PARAM, self.recipe_id.as_str()),
                (DATABASE_PARAM, self.partition.as_str()),
            ],
        )
    }
}

/// Session history of the host. Updates never trigger a navigation.
pub trait History: Send + Sync {
    fn location(&self) -> Url;
    /// Replaces the current entry.
    fn replace(&self, url: Url);
    /// Adds a new entry.
    fn push(&self, url: Url);
}

/// History kept in memory (the CLI host and tests).
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<Vec<Url>>,
}

impl MemoryHistory {
    pub fn new(initial: Url) -> Self {
        Self {
            entries: Mutex::new(vec![initial]),
        }
    }

    /// Parses the initial location.
    ///
    /// # Errors
    /// Returns an error if `initial` is not an absolute URL.
    pub fn parse(initial: &str) -> Result<Self> {
        let url = Url::parse(initial).with_context(|| format!("Invalid location: {initial}"))?;
        Ok(Self::new(url))
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<Url> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl History for MemoryHistory {
    fn location(&self) -> Url {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        // Never empty: constructed with one entry and only ever grown or replaced.
        entries[entries.len() - 1].clone()
    }

    fn replace(&self, url: Url) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(last) = entries.last_mut() {
            *last = url;
        } else {
            entries.push(url);
        }
    }

    fn push(&self, url: Url) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url);
    }
}

/// Performs full navigations away from the app.
pub trait Navigator: Send + Sync {
    /// Leaves the app for `url`.
    ///
    /// # Errors
    /// Returns an error if the navigation could not be started.
    fn navigate(&self, url: &Url) -> Result<()>;
}

/// Opens the system browser (best effort when disabled).
#[derive(Debug, Clone)]
pub struct BrowserNavigator {
    open_browser: bool,
}

impl BrowserNavigator {
    pub fn new(open_browser: bool) -> Self {
        Self { open_browser }
    }

    /// Honors `SAUCIER_NO_BROWSER`.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("SAUCIER_NO_BROWSER").is_none())
    }
}

impl Navigator for BrowserNavigator {
    fn navigate(&self, url: &Url) -> Result<()> {
        if !self.open_browser {
            tracing::debug!("browser disabled, not opening sign-in page");
            return Ok(());
        }
        open::that(url.as_str()).with_context(|| format!("Failed to open browser for {url}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_without_params_keeps_other_parameters() {
        let location = url("https://app.test/?a=1&recipeId=abc&b=2&database=public");
        let stripped = without_params(&location, &DEEP_LINK_PARAMS);
        assert_eq!(stripped.as_str(), "https://app.test/?a=1&b=2");

        let bare = without_params(&url("https://app.test/?recipeId=abc"), &DEEP_LINK_PARAMS);
        assert_eq!(bare.as_str(), "https://app.test/");
    }

    #[test]
    fn test_deep_link_requires_both_params() {
        assert_eq!(
            DeepLink::from_url(&url("https://app.test/?recipeId=abc123&database=public")),
            Some(DeepLink {
                recipe_id: "abc123".to_string(),
                partition: Partition::Public,
            })
        );
        assert!(DeepLink::from_url(&url("https://app.test/?recipeId=abc123")).is_none());
        assert!(DeepLink::from_url(&url("https://app.test/?database=private")).is_none());
        assert!(DeepLink::from_url(&url("https://app.test/?recipeId=a&database=shared")).is_none());
    }

    #[test]
    fn test_deep_link_apply_replaces_existing_values() {
        let link = DeepLink {
            recipe_id: "new".to_string(),
            partition: Partition::Private,
        };
        let applied = link.apply_to(&url("https://app.test/?recipeId=old&database=public&x=1"));
        assert_eq!(
            applied.as_str(),
            "https://app.test/?x=1&recipeId=new&database=private"
        );
    }

    #[test]
    fn test_memory_history_push_and_replace() {
        let history = MemoryHistory::parse("https://app.test/").unwrap();
        history.push(url("https://app.test/?recipeId=1&database=public"));
        history.replace(url("https://app.test/?recipeId=2&database=public"));

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            history.location().as_str(),
            "https://app.test/?recipeId=2&database=public"
        );
    }
}
