pub use controller::{LeaderboardController, LeaderboardState, DEFAULT_LEADERBOARD_LIMIT};

mod controller;
