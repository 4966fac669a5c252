//! Core saucier library (config, session, record store client).

pub mod cloudkit;
pub mod config;
pub mod location;
pub mod partition;
pub mod recipe;
pub mod session;

pub use cloudkit::{CloudKitClient, CloudKitError};
pub use partition::Partition;
pub use recipe::{Ingredient, Instruction, Recipe, RecipeDetail, RecipeImage};
pub use session::AuthSession;
