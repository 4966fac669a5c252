//! View-state orchestration for saucier.
//!
//! `update(state, event)` is the only place state changes; it returns
//! effects that [`AppRuntime`] executes against the record store, the
//! history and the navigator.

pub mod effects;
pub mod events;
pub mod pagination;
pub mod runtime;
pub mod state;
pub mod update;
pub mod view;

pub use effects::UiEffect;
pub use events::UiEvent;
pub use runtime::{AppRuntime, RunOutcome};
pub use state::AppState;
pub use view::{AppView, view};
