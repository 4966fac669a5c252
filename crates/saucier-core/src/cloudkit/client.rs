use std::collections::HashSet;
use std::sync::Arc;

use futures_util::future::try_join3;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use super::api::{
    AuthResponse, ErrorEnvelope, LookupRequest, NOT_FOUND, Query, QueryRequest, RawRecord,
    RecordRef, RecordsResponse, schema,
};
use super::errors::CloudKitError;
use super::mapping;
use crate::config::CloudKitSettings;
use crate::location::{Navigator, WEB_AUTH_TOKEN_PARAM};
use crate::partition::Partition;
use crate::recipe::{Ingredient, Instruction, Recipe, RecipeDetail, RecipeImage};
use crate::session::{AuthSession, mask_token};

/// Response header carrying the rotated web auth token.
pub const ROTATED_TOKEN_HEADER: &str = "X-Apple-CloudKit-Web-Auth-Token";

const API_TOKEN_PARAM: &str = "ckAPIToken";

/// Page size requested for recipe listings (server maximum is 200).
const RECIPE_PAGE_LIMIT: u32 = 200;

type Result<T> = std::result::Result<T, CloudKitError>;

/// Whether the session token is attached to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Session,
    ApiTokenOnly,
}

/// Sign-in redirect that was handed to the navigator.
///
/// The page that started sign-in is gone once this exists; callers should
/// stop and let the post-redirect location bootstrap a new session.
#[derive(Debug, Clone)]
#[must_use]
pub struct SignInRedirect {
    pub url: Url,
}

/// Client for the recipe container in CloudKit Web Services.
///
/// Every request carries the API token and, when present, the session
/// token. Every response to a request that carried a session token must
/// carry a rotated one; a response without it signs the session out.
#[derive(Clone)]
pub struct CloudKitClient {
    http: reqwest::Client,
    settings: Arc<CloudKitSettings>,
    session: Arc<AuthSession>,
}

impl CloudKitClient {
    pub fn new(settings: CloudKitSettings, session: Arc<AuthSession>) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings: Arc::new(settings),
            session,
        }
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// All recipes in the partition, newest first, following continuation
    /// markers until the last page.
    ///
    /// # Errors
    /// Returns transport, backend or decode errors from any page.
    pub async fn fetch_recipes(&self, partition: Partition) -> Result<Vec<Recipe>> {
        let query = Query::new(schema::RECIPE).sort(schema::RECIPE_DATE_CREATED, false);
        let records = self
            .query_all(partition, &query, Some(RECIPE_PAGE_LIMIT))
            .await?;

        let recipes: Vec<Recipe> = records.iter().map(mapping::recipe_from_record).collect();
        let recipes = mapping::dedupe_by_id(recipes, |recipe| recipe.id.as_str());
        tracing::debug!(%partition, count = recipes.len(), "fetched recipes");
        Ok(recipes)
    }

    /// Direct lookup of one recipe. Not found is `Ok(None)`.
    ///
    /// # Errors
    /// Returns transport, backend or decode errors; never for a missing record.
    pub async fn fetch_recipe_by_id(
        &self,
        partition: Partition,
        recipe_id: &str,
    ) -> Result<Option<Recipe>> {
        let url = self.database_url(partition, "records/lookup")?;
        let body = LookupRequest {
            records: vec![RecordRef {
                record_name: recipe_id,
            }],
        };
        let (status, text) = self
            .execute(Method::POST, url, Some(to_json(&body)?), Auth::Session)
            .await?;

        if status == StatusCode::NOT_FOUND && is_not_found_envelope(&text) {
            tracing::debug!(%partition, recipe_id, "recipe not found");
            return Ok(None);
        }

        let response = decode_records(status, &text)?;
        let Some(record) = response.records.into_iter().next() else {
            return Ok(None);
        };

        if let Some(error) = record.error() {
            if error.server_error_code == NOT_FOUND {
                tracing::debug!(%partition, recipe_id, "recipe not found");
                return Ok(None);
            }
            return Err(CloudKitError::Backend {
                errors: vec![error],
            });
        }

        if record
            .record_type
            .as_deref()
            .is_some_and(|record_type| record_type != schema::RECIPE)
        {
            tracing::debug!(%partition, recipe_id, "record is not a recipe");
            return Ok(None);
        }

        Ok(Some(mapping::recipe_from_record(&record)))
    }

    /// # Errors
    /// Returns transport, backend or decode errors.
    pub async fn fetch_ingredients(
        &self,
        partition: Partition,
        recipe_id: &str,
    ) -> Result<Vec<Ingredient>> {
        let query = Query::new(schema::INGREDIENT).filter_equals(schema::RECIPE_REFERENCE, recipe_id);
        let records = self.query_children(partition, &query).await?;
        Ok(records.iter().map(mapping::ingredient_from_record).collect())
    }

    /// Steps in ascending index order, regardless of backend order.
    ///
    /// # Errors
    /// Returns transport, backend or decode errors.
    pub async fn fetch_instructions(
        &self,
        partition: Partition,
        recipe_id: &str,
    ) -> Result<Vec<Instruction>> {
        let query = Query::new(schema::INSTRUCTION)
            .filter_equals(schema::RECIPE_REFERENCE, recipe_id)
            .sort(schema::INSTRUCTION_INDEX, true);
        let records = self.query_children(partition, &query).await?;

        let mut instructions: Vec<Instruction> = records
            .iter()
            .map(mapping::instruction_from_record)
            .collect();
        mapping::sort_instructions(&mut instructions);
        Ok(instructions)
    }

    /// # Errors
    /// Returns transport, backend or decode errors.
    pub async fn fetch_images(
        &self,
        partition: Partition,
        recipe_id: &str,
    ) -> Result<Vec<RecipeImage>> {
        let query =
            Query::new(schema::RECIPE_IMAGE).filter_equals(schema::RECIPE_REFERENCE, recipe_id);
        let records = self.query_children(partition, &query).await?;
        Ok(records.iter().map(mapping::image_from_record).collect())
    }

    /// Ingredients, instructions and images fetched concurrently.
    ///
    /// # Errors
    /// Returns the first error among the three fetches.
    pub async fn fetch_recipe_detail(
        &self,
        partition: Partition,
        recipe: &Recipe,
    ) -> Result<RecipeDetail> {
        let (ingredients, instructions, images) = try_join3(
            self.fetch_ingredients(partition, &recipe.id),
            self.fetch_instructions(partition, &recipe.id),
            self.fetch_images(partition, &recipe.id),
        )
        .await?;

        Ok(RecipeDetail {
            recipe: recipe.with_details(ingredients, instructions),
            images,
        })
    }

    /// Asks the auth endpoint where the external sign-in lives.
    ///
    /// # Errors
    /// Returns an error if the response carries no redirect URL.
    pub async fn sign_in_url(&self) -> Result<Url> {
        let url = self.container_url("private/users/current")?;
        let (status, text) = self
            .execute(Method::GET, url, None, Auth::ApiTokenOnly)
            .await?;

        // Anonymous callers get 421 AUTHENTICATION_REQUIRED with the redirect.
        let redirect = serde_json::from_str::<AuthResponse>(&text)
            .ok()
            .and_then(|response| response.redirect_url);

        match redirect {
            Some(redirect) => Url::parse(&redirect).map_err(|err| CloudKitError::Protocol {
                message: format!("invalid sign-in redirect URL: {err}"),
            }),
            None if !status.is_success() => Err(CloudKitError::Transport {
                status: status.as_u16(),
                body: text,
            }),
            None => Err(CloudKitError::Protocol {
                message: "auth response did not include a redirectURL".to_string(),
            }),
        }
    }

    /// Starts the external sign-in: resolves the redirect and navigates
    /// away. Completion arrives later as a `ckWebAuthToken` location
    /// parameter, consumed by [`AuthSession::bootstrap`].
    ///
    /// # Errors
    /// Returns an error if the redirect could not be fetched or opened.
    pub async fn begin_sign_in(&self, navigator: &dyn Navigator) -> anyhow::Result<SignInRedirect> {
        let url = self.sign_in_url().await?;
        tracing::info!("navigating to sign-in");
        navigator.navigate(&url)?;
        Ok(SignInRedirect { url })
    }

    async fn query_all(
        &self,
        partition: Partition,
        query: &Query,
        results_limit: Option<u32>,
    ) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        let mut marker: Option<String> = None;
        let mut seen = HashSet::new();
        let mut pages = 0_usize;

        loop {
            let response = self
                .query_page(partition, query, results_limit, marker.as_deref())
                .await?;
            pages += 1;
            records.extend(response.records);

            match response.continuation_marker.filter(|next| !next.is_empty()) {
                Some(next) if !seen.insert(next.clone()) => {
                    tracing::warn!(%partition, pages, "continuation marker repeated, stopping");
                    break;
                }
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        tracing::debug!(%partition, record_type = query.record_type, pages, "query complete");
        Ok(records)
    }

    /// Child records are bounded by recipe structure and fit in one page.
    async fn query_children(&self, partition: Partition, query: &Query) -> Result<Vec<RawRecord>> {
        let response = self.query_page(partition, query, None, None).await?;
        if response.continuation_marker.is_some() {
            tracing::warn!(
                %partition,
                record_type = query.record_type,
                "child query has more pages, only the first is used"
            );
        }
        Ok(response.records)
    }

    async fn query_page(
        &self,
        partition: Partition,
        query: &Query,
        results_limit: Option<u32>,
        continuation_marker: Option<&str>,
    ) -> Result<RecordsResponse> {
        let url = self.database_url(partition, "records/query")?;
        let body = QueryRequest {
            query,
            results_limit,
            continuation_marker,
        };
        let (status, text) = self
            .execute(Method::POST, url, Some(to_json(&body)?), Auth::Session)
            .await?;

        let response = decode_records(status, &text)?;
        let record_errors: Vec<_> = response.records.iter().filter_map(RawRecord::error).collect();
        if !record_errors.is_empty() {
            return Err(CloudKitError::Backend {
                errors: record_errors,
            });
        }
        Ok(response)
    }

    async fn execute(
        &self,
        method: Method,
        mut url: Url,
        body: Option<Value>,
        auth: Auth,
    ) -> Result<(StatusCode, String)> {
        let sent_token = self.authorize(&mut url, auth);
        tracing::debug!(%method, path = url.path(), "cloudkit request");

        let mut request = self.http.request(method, url);
        if let Some(body) = &body {
            request = request.json(body);
        }
        let response = request
            .send()
            .await
            .map_err(|err| CloudKitError::request(&err))?;

        let status = response.status();
        let header_token = response
            .headers()
            .get(ROTATED_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let text = response
            .text()
            .await
            .map_err(|err| CloudKitError::request(&err))?;

        if auth == Auth::Session {
            let rotated = header_token.or_else(|| body_token(&text));
            self.observe_rotation(sent_token.as_deref(), rotated.as_deref());
        }

        Ok((status, text))
    }

    fn authorize(&self, url: &mut Url, auth: Auth) -> Option<String> {
        let token = match auth {
            Auth::Session => self.session.token(),
            Auth::ApiTokenOnly => None,
        };

        let mut pairs = url.query_pairs_mut();
        pairs.append_pair(API_TOKEN_PARAM, &self.settings.api_token);
        if let Some(token) = &token {
            pairs.append_pair(WEB_AUTH_TOKEN_PARAM, token);
        }
        drop(pairs);
        token
    }

    fn observe_rotation(&self, sent: Option<&str>, rotated: Option<&str>) {
        match (sent, rotated) {
            (_, Some(token)) => {
                if sent != Some(token) {
                    tracing::debug!(token = %mask_token(token), "session token rotated");
                }
                if let Err(err) = self.session.update_token(token) {
                    tracing::warn!("failed to persist rotated session token: {err:#}");
                }
            }
            (Some(sent), None) => match self.session.expire(sent) {
                Ok(true) => tracing::info!("response carried no session token, signed out"),
                Ok(false) => {}
                Err(err) => tracing::warn!("failed to clear expired session token: {err:#}"),
            },
            (None, None) => {}
        }
    }

    fn container_url(&self, path: &str) -> Result<Url> {
        let raw = format!(
            "{}/database/1/{}/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.container_identifier,
            self.settings.environment,
            path
        );
        Url::parse(&raw).map_err(|err| CloudKitError::Protocol {
            message: format!("invalid CloudKit URL {raw}: {err}"),
        })
    }

    fn database_url(&self, partition: Partition, path: &str) -> Result<Url> {
        self.container_url(&format!("{}/{path}", partition.database_scope()))
    }
}

fn to_json<B: Serialize>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|err| CloudKitError::Protocol {
        message: format!("failed to encode request: {err}"),
    })
}

fn decode_records(status: StatusCode, text: &str) -> Result<RecordsResponse> {
    if !status.is_success() {
        return Err(CloudKitError::Transport {
            status: status.as_u16(),
            body: text.to_string(),
        });
    }

    let response: RecordsResponse =
        serde_json::from_str(text).map_err(|err| CloudKitError::Decode {
            message: err.to_string(),
            body: text.to_string(),
        })?;

    if response.has_errors || !response.errors.is_empty() {
        return Err(CloudKitError::Backend {
            errors: response.errors,
        });
    }
    Ok(response)
}

fn is_not_found_envelope(text: &str) -> bool {
    serde_json::from_str::<ErrorEnvelope>(text)
        .is_ok_and(|envelope| envelope.server_error_code == NOT_FOUND)
}

fn body_token(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    value
        .get(WEB_AUTH_TOKEN_PARAM)
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
