pub use controller::{MetricsController, MetricsState, ADMIN_API_KEY_REQUIRED};

mod controller;
