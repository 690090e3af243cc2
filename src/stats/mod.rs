pub use controller::{
    RetryPhase, RetryPolicy, StatsController, StatsLoad, StatsState, STATS_PROCESSING_MESSAGE,
};

mod controller;
