use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use strum::IntoEnumIterator;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mathgame_client::api::{
    AnswerResult, Difficulty, GameMode, LeaderboardScope, MetricsSnapshot, PlayerStats, Question,
};
use mathgame_client::format::{format_accuracy, format_number, format_time};
use mathgame_client::leaderboard::{LeaderboardState, DEFAULT_LEADERBOARD_LIMIT};
use mathgame_client::session::{PetNameGenerator, PlayerNameGenerator};
use mathgame_client::{
    AutoRefresh, ClientConfig, ClientError, ErrorFeed, FileSessionStore, GameSessionController,
    HttpScoringApi, InMemorySessionStore, LeaderboardController, MetricsController, ScoringApi,
    SessionStore, StatsController, StatsLoad,
};

#[derive(Debug, Parser)]
#[command(name = "mathgame", version, about = "Play the math game from a terminal")]
struct Cli {
    /// Scoring service base URL (overrides MATHGAME_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a session of questions
    Play {
        /// Player name; a random one is picked when omitted
        #[arg(long)]
        player: Option<String>,
        #[arg(long, default_value_t = GameMode::Arithmetic)]
        mode: GameMode,
        #[arg(long, default_value_t = Difficulty::Easy)]
        difficulty: Difficulty,
        /// Number of questions before the session ends
        #[arg(long, default_value_t = 5)]
        rounds: u32,
    },
    /// Show a player's aggregate stats
    Stats {
        player: String,
        /// Also fetch the per-player metrics view
        #[arg(long)]
        detailed: bool,
        /// Keep refreshing until Ctrl-C
        #[arg(long)]
        watch: bool,
    },
    /// Browse the leaderboard
    Leaderboard {
        #[arg(long, default_value_t = LeaderboardScope::All)]
        scope: LeaderboardScope,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_LEADERBOARD_LIMIT)]
        limit: u32,
        /// Page with n/p, switch scope with `s <scope>`, quit with q
        #[arg(long)]
        interactive: bool,
    },
    /// Show or reset the service metrics (admin)
    Metrics {
        /// Falls back to MATHGAME_ADMIN_API_KEY
        #[arg(long)]
        admin_key: Option<String>,
        #[arg(long)]
        reset: bool,
        #[arg(long)]
        watch: bool,
    },
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with prompts
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mathgame_client=info,mathgame=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config = config.with_base_url(api_url);
    }
    info!(base_url = %config.base_url, "Using scoring service");

    let api: Arc<dyn ScoringApi> =
        Arc::new(HttpScoringApi::new(&config).context("could not set up the HTTP client")?);
    let mut feed = ErrorFeed::new();

    match cli.command {
        Command::Play {
            player,
            mode,
            difficulty,
            rounds,
        } => play(&config, api, &mut feed, player, mode, difficulty, rounds).await?,
        Command::Stats {
            player,
            detailed,
            watch,
        } => show_stats(&config, api, &mut feed, player, detailed, watch).await?,
        Command::Leaderboard {
            scope,
            page,
            limit,
            interactive,
        } => browse_leaderboard(api, &mut feed, scope, page, limit, interactive).await?,
        Command::Metrics {
            admin_key,
            reset,
            watch,
        } => {
            let admin_key = admin_key
                .or_else(|| std::env::var("MATHGAME_ADMIN_API_KEY").ok())
                .unwrap_or_default();
            show_metrics(&config, api, &mut feed, admin_key, reset, watch).await?
        }
    }

    Ok(())
}

fn session_store(config: &ClientConfig) -> Arc<dyn SessionStore> {
    match &config.session_store_path {
        Some(path) => Arc::new(FileSessionStore::new(path)),
        None => Arc::new(InMemorySessionStore::new()),
    }
}

async fn play(
    config: &ClientConfig,
    api: Arc<dyn ScoringApi>,
    feed: &mut ErrorFeed,
    player: Option<String>,
    mode: GameMode,
    difficulty: Difficulty,
    rounds: u32,
) -> anyhow::Result<()> {
    let controller = GameSessionController::mount(api.clone(), session_store(config)).await;
    let chosen_name = player.is_some();
    let player = player.unwrap_or_else(|| PetNameGenerator.generate());

    let resumed = controller.session_id().await;
    match resumed {
        Some(session_id) => println!("Resuming session {}", session_id),
        None => {
            if let Err(e) = controller
                .start_session(&player, Some(mode), Some(difficulty))
                .await
            {
                report(feed, e);
                return Ok(());
            }
            println!("Playing as {} ({}, {})", player, mode, difficulty);
        }
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut answered = 0;
    'rounds: while answered < rounds {
        let question = match controller.generate_question(mode, difficulty).await {
            Ok(question) => question,
            Err(e) => {
                report(feed, e);
                break;
            }
        };
        print_question(answered + 1, rounds, &question);
        let asked_at = Instant::now();

        loop {
            let Some(line) = prompt(&mut input, "Your answer (q to quit): ").await? else {
                break 'rounds;
            };
            if line.trim().eq_ignore_ascii_case("q") {
                break 'rounds;
            }

            let elapsed_ms = asked_at.elapsed().as_millis() as u64;
            match controller.submit_answer(&line, elapsed_ms).await {
                Ok(result) => {
                    print_feedback(&result, elapsed_ms);
                    answered += 1;
                    break;
                }
                Err(e @ ClientError::Validation(_)) => report(feed, e),
                Err(e) => {
                    report(feed, e);
                    break 'rounds;
                }
            }
        }
    }

    match controller.end_session().await {
        Ok(Some(ended)) => {
            println!("\nSession {} finished.", ended.session_id);
            if !ended.summary.is_null() {
                println!("{}", serde_json::to_string_pretty(&ended.summary)?);
            }
        }
        Ok(None) => debug!("No session to end"),
        Err(e) => report(feed, e),
    }

    // A resumed session may belong to someone else; only look up a name we were given
    if answered == 0 || (resumed.is_some() && !chosen_name) {
        return Ok(());
    }

    let stats = StatsController::new(api, player, config.stats_retry_delay);
    load_and_print_stats(&stats, feed).await;
    Ok(())
}

async fn show_stats(
    config: &ClientConfig,
    api: Arc<dyn ScoringApi>,
    feed: &mut ErrorFeed,
    player: String,
    detailed: bool,
    watch: bool,
) -> anyhow::Result<()> {
    let stats = Arc::new(StatsController::new(api, player, config.stats_retry_delay));
    load_and_print_stats(&stats, feed).await;

    if detailed {
        match stats.load_metrics().await {
            Ok(metrics) => {
                if let Some(avg) = metrics.average_response_time {
                    println!("Avg response:  {}", format_time(avg.round() as u64));
                }
                println!("As of:         {}", metrics.timestamp.to_rfc3339());
            }
            Err(e) => report(feed, e),
        }
    }

    if watch {
        let watched = stats.clone();
        let _refresh = AutoRefresh::spawn(config.refresh_interval, move || {
            let stats = watched.clone();
            Box::pin(async move {
                let mut feed = ErrorFeed::new();
                load_and_print_stats(&stats, &mut feed).await;
            })
        });
        wait_for_ctrl_c().await?;
    }
    Ok(())
}

async fn load_and_print_stats(stats: &StatsController, feed: &mut ErrorFeed) {
    match stats.load_stats().await {
        Ok(StatsLoad::Loaded(player_stats)) => print_player_stats(&player_stats),
        Ok(StatsLoad::RetryScheduled) => {
            println!("Waiting for stats to be processed...");
            stats.settle().await;
            match stats.stats().await {
                Some(player_stats) => print_player_stats(&player_stats),
                None => {
                    feed.collect(stats.error().await);
                    flush_feed(feed);
                }
            }
        }
        Err(e) => report(feed, e),
    }
}

async fn browse_leaderboard(
    api: Arc<dyn ScoringApi>,
    feed: &mut ErrorFeed,
    scope: LeaderboardScope,
    page: u32,
    limit: u32,
    interactive: bool,
) -> anyhow::Result<()> {
    let leaderboard = LeaderboardController::with_limit(api, limit);
    match leaderboard.load(scope, page).await {
        Ok(_) => print_leaderboard(&leaderboard.snapshot().await),
        Err(e) => report(feed, e),
    }
    if !interactive {
        return Ok(());
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = prompt(&mut input, "[n]ext [p]rev [s <scope>] [r]efresh [q]uit: ").await? {
        let mut words = line.split_whitespace();
        let outcome = match words.next() {
            Some("n") => leaderboard.next_page().await.map(|page| page.is_some()),
            Some("p") => leaderboard.previous_page().await.map(|page| page.is_some()),
            Some("r") => leaderboard.refresh().await.map(|_| true),
            Some("s") => match words.next().map(str::parse::<LeaderboardScope>) {
                Some(Ok(scope)) => leaderboard.set_scope(scope).await.map(|_| true),
                _ => {
                    let scopes: Vec<String> =
                        LeaderboardScope::iter().map(|s| s.to_string()).collect();
                    println!("Scopes: {}", scopes.join(", "));
                    continue;
                }
            },
            Some("q") => break,
            _ => continue,
        };

        match outcome {
            Ok(true) => print_leaderboard(&leaderboard.snapshot().await),
            Ok(false) => println!("No more pages that way."),
            Err(e) => {
                report(feed, e);
                leaderboard.clear_error().await;
            }
        }
    }
    Ok(())
}

async fn show_metrics(
    config: &ClientConfig,
    api: Arc<dyn ScoringApi>,
    feed: &mut ErrorFeed,
    admin_key: String,
    reset: bool,
    watch: bool,
) -> anyhow::Result<()> {
    let metrics = Arc::new(MetricsController::new(api));
    let result = if reset {
        metrics.reset_metrics(&admin_key).await
    } else {
        metrics.load_metrics(&admin_key).await
    };
    match result {
        Ok(snapshot) => {
            if let Some(message) = metrics.snapshot().await.last_reset {
                println!("{}", message);
            }
            print_metrics(&snapshot);
        }
        Err(e) => {
            report(feed, e);
            return Ok(());
        }
    }

    if watch {
        let watched = metrics.clone();
        let _refresh = AutoRefresh::spawn(config.refresh_interval, move || {
            let metrics = watched.clone();
            let admin_key = admin_key.clone();
            Box::pin(async move {
                match metrics.load_metrics(&admin_key).await {
                    Ok(snapshot) => print_metrics(&snapshot),
                    Err(e) => eprintln!("error: {}", e),
                }
            })
        });
        wait_for_ctrl_c().await?;
    }
    Ok(())
}

async fn prompt(input: &mut InputLines, label: &str) -> anyhow::Result<Option<String>> {
    print!("{}", label);
    std::io::stdout().flush()?;
    Ok(input.next_line().await?)
}

async fn wait_for_ctrl_c() -> anyhow::Result<()> {
    println!("Refreshing; press Ctrl-C to stop.");
    tokio::signal::ctrl_c().await?;
    Ok(())
}

/// Shows each pending error once, then dismisses it.
fn report(feed: &mut ErrorFeed, error: ClientError) {
    feed.push(error.to_string());
    flush_feed(feed);
}

fn flush_feed(feed: &mut ErrorFeed) {
    for message in feed.drain() {
        eprintln!("error: {}", message);
    }
}

fn print_question(number: u32, rounds: u32, question: &Question) {
    println!();
    match question.max_time_ms {
        Some(limit) => println!(
            "Question {}/{} ({} to answer)",
            number,
            rounds,
            format_time(limit)
        ),
        None => println!("Question {}/{}", number, rounds),
    }
    println!("  {}", question.question_text);
}

fn print_feedback(result: &AnswerResult, elapsed_ms: u64) {
    if result.is_correct {
        println!(
            "Correct! {:+} points in {}",
            result.score_delta,
            format_time(elapsed_ms)
        );
    } else {
        println!(
            "Not quite. The answer was {} ({:+} points)",
            result.correct_answer, result.score_delta
        );
    }
    println!(
        "Score: {}  Accuracy: {}  Avg time: {}",
        format_number(result.total_score),
        format_accuracy(result.stats.accuracy),
        format_time(result.stats.avg_time_ms.round() as u64)
    );
}

fn print_player_stats(stats: &PlayerStats) {
    println!("\nStats for {}", stats.player_name);
    println!("Sessions:      {}", format_number(stats.total_sessions.into()));
    println!(
        "Questions:     {} ({} correct, {} wrong)",
        format_number(stats.total_questions.into()),
        format_number(stats.total_correct.into()),
        format_number(stats.total_wrong.into())
    );
    println!("Accuracy:      {}", format_accuracy(stats.accuracy));
    if let Some(avg) = stats.avg_time_ms {
        println!("Avg time:      {}", format_time(avg.round() as u64));
    }
    println!("Total score:   {}", format_number(stats.total_score));
    println!("Best score:    {}", format_number(stats.best_score));
    for breakdown in &stats.by_difficulty {
        println!(
            "  {:<7} {:>5} questions  {:>6}",
            breakdown.level,
            format_number(breakdown.total_questions.into()),
            format_accuracy(breakdown.accuracy)
        );
    }
}

fn print_leaderboard(state: &LeaderboardState) {
    let Some(response) = &state.response else {
        return;
    };
    println!(
        "\nLeaderboard ({}) page {} of {} players",
        response.scope,
        state.page,
        format_number(response.pagination.total as i64)
    );
    for entry in &response.entries {
        println!(
            "{:>4}. {:<24} {:>10}  {:>6}",
            entry.rank,
            entry.player_name,
            format_number(entry.total_score),
            format_accuracy(entry.accuracy)
        );
    }
}

fn print_metrics(metrics: &MetricsSnapshot) {
    println!(
        "\nRequests: {}  Errors: {}  Req/s: {:.2}",
        format_number(metrics.total_requests as i64),
        format_number(metrics.total_errors as i64),
        metrics.requests_per_second
    );
    println!(
        "Response time: avg {:.1}ms  p50 {:.1}ms  p95 {:.1}ms  p99 {:.1}ms",
        metrics.average_response_time,
        metrics.response_time_percentiles.p50,
        metrics.response_time_percentiles.p95,
        metrics.response_time_percentiles.p99
    );

    let mut endpoints: Vec<_> = metrics.endpoints.iter().collect();
    endpoints.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    for (endpoint, stats) in endpoints {
        println!(
            "  {:<32} {:>6} calls  {:>7.1}ms  {} errors",
            endpoint, stats.count, stats.avg_response_time, stats.errors
        );
    }
}
