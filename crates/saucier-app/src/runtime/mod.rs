//! App runtime: owns state, drains the inbox, executes effects.
//!
//! This is the effect boundary: all I/O happens here. The reducer stays
//! pure and produces effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! - Spawned fetches send their completion `UiEvent` to `inbox_tx`
//! - The auth session listener sends `AuthChanged` to the same inbox
//! - `run_until_idle` drains the inbox until no fetch is in flight

mod handlers;

use std::future::Future;
use std::sync::Arc;

use saucier_core::CloudKitClient;
use saucier_core::location::{History, Navigator};
use saucier_core::session::ListenerId;
use tokio::sync::mpsc;
use url::Url;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::update;
use crate::view::{self, AppView};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum RunOutcome {
    /// Inbox empty and nothing in flight.
    Idle,
    /// The app navigated away (sign-in). Nothing more runs in this context.
    Navigated(Url),
}

pub struct AppRuntime {
    state: AppState,
    client: CloudKitClient,
    history: Arc<dyn History>,
    navigator: Arc<dyn Navigator>,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    /// Spawned fetches whose completion event has not been reduced yet.
    in_flight: usize,
    listener: ListenerId,
}

impl AppRuntime {
    /// Creates the runtime at the history's current location and subscribes
    /// to auth transitions of the client's session.
    pub fn new(
        client: CloudKitClient,
        history: Arc<dyn History>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        let tx = inbox_tx.clone();
        let listener = client.session().subscribe(Arc::new(move |authenticated| {
            let _ = tx.send(UiEvent::AuthChanged(authenticated));
        }));

        let state = AppState::new(history.location(), client.session().is_authenticated());

        Self {
            state,
            client,
            history,
            navigator,
            inbox_tx,
            inbox_rx,
            in_flight: 0,
            listener,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppView {
        view::view(&self.state)
    }

    pub fn history(&self) -> &Arc<dyn History> {
        &self.history
    }

    /// Queues an event. It is reduced by the next `run_until_idle`.
    pub fn dispatch(&self, event: UiEvent) {
        let _ = self.inbox_tx.send(event);
    }

    /// Queues the startup event.
    pub fn start(&self) {
        self.dispatch(UiEvent::Started);
    }

    /// Reduces queued events and executes their effects until the inbox is
    /// empty and no fetch is in flight.
    pub async fn run_until_idle(&mut self) -> RunOutcome {
        loop {
            let event = match self.inbox_rx.try_recv() {
                Ok(event) => event,
                Err(_) if self.in_flight == 0 => return RunOutcome::Idle,
                Err(_) => match self.inbox_rx.recv().await {
                    Some(event) => event,
                    // Unreachable while `inbox_tx` is held here.
                    None => return RunOutcome::Idle,
                },
            };

            if event.is_completion() {
                self.in_flight = self.in_flight.saturating_sub(1);
            }

            let effects = update::update(&mut self.state, event);
            for effect in effects {
                if let Some(url) = self.execute_effect(effect).await {
                    return RunOutcome::Navigated(url);
                }
            }
        }
    }

    /// Executes one effect. Returns the target of a navigation away from
    /// the app.
    async fn execute_effect(&mut self, effect: UiEffect) -> Option<Url> {
        match effect {
            UiEffect::LoadRecipes {
                partition,
                generation,
            } => {
                self.spawn_effect(handlers::load_recipes(
                    self.client.clone(),
                    partition,
                    generation,
                ));
            }
            UiEffect::LookupRecipe { link } => {
                self.spawn_effect(handlers::lookup_recipe(self.client.clone(), link));
            }
            UiEffect::LoadDetail { partition, recipe } => {
                self.spawn_effect(handlers::load_detail(self.client.clone(), partition, recipe));
            }
            UiEffect::ReplaceLocation { url } => {
                tracing::debug!(%url, "replacing location");
                self.history.replace(url);
            }
            UiEffect::PushLocation { url } => {
                tracing::debug!(%url, "pushing location");
                self.history.push(url);
            }
            UiEffect::BeginSignIn => {
                match self.client.begin_sign_in(self.navigator.as_ref()).await {
                    Ok(redirect) => return Some(redirect.url),
                    Err(err) => self.dispatch(UiEvent::SignInFailed(format!("{err:#}"))),
                }
            }
        }
        None
    }

    /// Spawns a fetch whose result event goes to the inbox.
    fn spawn_effect<Fut>(&mut self, fut: Fut)
    where
        Fut: Future<Output = UiEvent> + Send + 'static,
    {
        self.in_flight += 1;
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }
}

impl Drop for AppRuntime {
    fn drop(&mut self) {
        self.client.session().unsubscribe(self.listener);
    }
}
