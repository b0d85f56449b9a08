// scorepick entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Load config
// 3. Initialize tracing (log to <output.dir>/scorepick.log)
// 4. Fix the season and "today" for the whole run
// 5. Build the league client and load the injury report
// 6. Dispatch to backtest / slots / evaluate

use std::path::Path;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use scorepick_app::backtest::{BacktestSummary, Backtester};
use scorepick_app::cli::{resolve_range, Cli, Command};
use scorepick_app::{contest, history, report, slots};
use scorepick_core::config::{self, Config};
use scorepick_core::reconcile::OverrideTables;
use scorepick_core::season::SeasonId;
use scorepick_nhl::NhlClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;
    let output_dir = Path::new(&config.output.dir);
    init_tracing(output_dir)?;
    info!("scorepick starting: {:?}", cli.command);

    match cli.command {
        Command::Evaluate { history: history_path } => {
            let pick_history = history::load_history(&history_path)?;
            let evaluation = history::evaluate(&pick_history);
            let (summary, details) = history::save_evaluation(output_dir, &evaluation)?;
            println!(
                "Evaluated {} days: {}/{} picks correct",
                evaluation.days.len(),
                evaluation.total_correct(),
                evaluation.total_picks()
            );
            println!("Summary: {}\nDetails: {}", summary.display(), details.display());
        }
        Command::Backtest { start, end, top } => {
            let today = Local::now().date_naive();
            let (start, end) =
                resolve_range(start, end, today, config.backtest.default_range_days);
            let top_n = top.unwrap_or(config.backtest.top_n);
            anyhow::ensure!(top_n > 0, "--top must be at least 1");
            run_backtest(&config, today, start, end, top_n).await?;
        }
        Command::Slots { snapshot, date } => {
            let today = Local::now().date_naive();
            run_slots(&config, today, &snapshot, date).await?;
        }
    }

    info!("scorepick finished");
    Ok(())
}

async fn connect(config: &Config, today: NaiveDate) -> anyhow::Result<(NhlClient, SeasonId)> {
    let season = SeasonId::containing(today);
    info!("active season {season}");
    let client = NhlClient::new(&config.api).context("failed to build HTTP client")?;
    client.load_injury_report().await;
    Ok((client, season))
}

async fn run_backtest(
    config: &Config,
    today: NaiveDate,
    start: NaiveDate,
    end: NaiveDate,
    top_n: usize,
) -> anyhow::Result<()> {
    let (client, season) = connect(config, today).await?;
    info!("backtesting {start}..={end}, top {top_n}");
    println!("Backtesting {start} to {end} (season {season}, top {top_n})");

    let backtester = Backtester::new(&client, season, today, top_n);
    let results = backtester.run(start, end).await;
    let summary = BacktestSummary::from_results(&results);

    let output_dir = Path::new(&config.output.dir);
    let results_path = report::save_results(output_dir, &results, top_n)?;
    let summary_path = report::save_summary(output_dir, &summary)?;
    println!(
        "{} days evaluated, {}/{} picks correct ({:.1}%)",
        summary.days_evaluated,
        summary.total_correct,
        summary.total_picks,
        summary.accuracy() * 100.0
    );
    println!("Results: {}", results_path.display());
    println!("Summary: {}", summary_path.display());
    Ok(())
}

async fn run_slots(
    config: &Config,
    today: NaiveDate,
    snapshot_path: &Path,
    date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let snapshot = contest::load_snapshot(snapshot_path)?;
    let overrides = OverrideTables::load(&config.data_paths);
    let (client, season) = connect(config, today).await?;

    let picker = slots::SlotPicker::new(&client, season, &overrides);
    let rankings = picker.rank_sets(&snapshot).await;

    let output_dir = Path::new(&config.output.dir);
    for ranking in &rankings {
        let path = output_dir.join(format!("rankings_set{}.csv", ranking.set_id));
        report::save_rankings(&path, &ranking.ranked)?;
        match ranking.pick() {
            Some(top) => println!(
                "Set {}: {} ({}, {} goals, {} in last 5)",
                ranking.set_id, top.full_name, top.team_abbrev, top.goals, top.recent_goals
            ),
            None => println!("Set {}: no pick", ranking.set_id),
        }
    }

    let Some(contest_date) = date.or_else(|| snapshot.date()) else {
        return Ok(());
    };
    if contest_date > today {
        println!("Contest date {contest_date} has not been played yet; picks not scored");
        return Ok(());
    }

    let top_n = rankings.len();
    let backtester = Backtester::new(&client, season, today, top_n);
    match slots::score_slots(&backtester, contest_date, &rankings).await {
        Some(result) => {
            println!(
                "{contest_date}: {}/{} picks scored",
                result.correct_count, result.total_count
            );
            let results = [result];
            let summary = BacktestSummary::from_results(&results);
            let results_path = report::save_results(output_dir, &results, top_n)?;
            let summary_path = report::save_summary(output_dir, &summary)?;
            println!("Results: {}", results_path.display());
            println!("Summary: {}", summary_path.display());
        }
        None => println!("Nothing to score on {contest_date}; picks not scored"),
    }
    Ok(())
}

/// Initialize tracing to log to a file so stdout stays readable.
fn init_tracing(log_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::File::create(log_dir.join("scorepick.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("scorepick=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
