// Public API - what the binary and integration tests use
pub use controller::{GameSessionController, SessionState, NO_ACTIVE_QUESTION, NO_ACTIVE_SESSION};
pub use names::{PetNameGenerator, PlayerNameGenerator, FALLBACK_PLAYER_NAME};
pub use store::{FileSessionStore, InMemorySessionStore, SessionStore, StoreError, SESSION_ID_KEY};

mod controller;
mod names;
mod store;
