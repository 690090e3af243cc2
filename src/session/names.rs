use petname::Generator;

use crate::validation::validate_player_name;

pub const FALLBACK_PLAYER_NAME: &str = "player";

/// Source of default player names when the user doesn't pick one.
pub trait PlayerNameGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Two-word pet names joined by a dash, e.g. `brave-otter`.
#[derive(Debug, Default)]
pub struct PetNameGenerator;

impl PlayerNameGenerator for PetNameGenerator {
    fn generate(&self) -> String {
        let name = petname::Petnames::default()
            .generate_one(2, "-")
            .unwrap_or_default();
        if validate_player_name(&name).is_ok() {
            name
        } else {
            FALLBACK_PLAYER_NAME.to_string()
        }
    }
}
