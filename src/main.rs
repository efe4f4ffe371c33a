// gridpick entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load league.toml
// 3. Open database
// 4. Load the starting grid (CSV if configured, built-in table otherwise)
// 5. Build roster and draft engine
// 6. Dispatch the subcommand

use std::sync::Arc;

use anyhow::{bail, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use gridpick::config::{team_id, Config};
use gridpick::db::{Database, SqlitePickLog};
use gridpick::draft::{draft_progress, DraftEngine, DraftPhase, PickLog, PickRequest};
use gridpick::feed::{self, DraftEvent};
use gridpick::grid::{CsvGrid, GridSource, StaticGrid};
use gridpick::results::{FinishOutcome, RaceClassification};
use gridpick::scoring::{score_player, season_standings, RaceScore};
use gridpick::tiers::tier_label;

const USAGE: &str = "\
usage: gridpick <command>

commands:
  order                                     print the snake pick order
  grid                                      print the starting grid with tiers
  draft                                     run an interactive draft session
  score <race-number> <race-name> <csv>     score a race from a results CSV
  standings                                 print the season standings table";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("gridpick starting up");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("help");
    if matches!(command, "help" | "--help" | "-h") {
        println!("{USAGE}");
        return Ok(());
    }

    // 2. Load config
    let config = Config::load("league.toml").context("failed to load league.toml")?;
    info!(
        "Config loaded: league={}, {} teams, {} rounds",
        config.league_name,
        config.teams.len(),
        config.drivers_per_team
    );

    // 3. Open database
    let db = Arc::new(Database::open(&config.db_path).context("failed to open database")?);
    info!("Database opened at {}", config.db_path);

    // 4. Load the starting grid
    let grid = match &config.grid_csv {
        Some(path) => CsvGrid::new(path)
            .starting_grid()
            .with_context(|| format!("failed to load grid from {}", path.display()))?,
        None => StaticGrid.starting_grid().context("invalid built-in grid")?,
    };
    info!("Grid loaded: {} drivers", grid.len());

    // 5. Build roster and draft engine
    let roster = config.roster().context("invalid team list")?;
    let engine = DraftEngine::new(
        roster,
        grid,
        config.drivers_per_team,
        config.one_per_tier,
    );
    let draft_id = team_id(&config.league_name);
    let log = SqlitePickLog::new(Arc::clone(&db), draft_id);

    // 6. Dispatch
    match command {
        "order" => cmd_order(&engine),
        "grid" => cmd_grid(&engine),
        "draft" => cmd_draft(&engine, &log).await?,
        "score" => cmd_score(&engine, &db, &log, &args[1..])?,
        "standings" => cmd_standings(&engine, &db)?,
        other => {
            println!("unknown command `{other}`\n\n{USAGE}");
        }
    }

    Ok(())
}

/// Print the full snake order for the configured league.
fn cmd_order(engine: &DraftEngine) {
    println!(
        "Snake order: {} teams x {} rounds",
        engine.roster().len(),
        engine.rounds()
    );
    for (idx, slot) in engine.pick_order().iter().enumerate() {
        let player = engine.roster().player_at(*slot);
        println!("  {:>3}. {}", idx + 1, player.display_name);
    }
}

/// Print the starting grid with derived tiers.
fn cmd_grid(engine: &DraftEngine) {
    for driver in engine.grid() {
        println!(
            "  P{:<3} {:<4} {:<22} {:<16} tier {} ({})",
            driver.start_position,
            driver.id,
            driver.name,
            driver.team,
            driver.tier,
            tier_label(driver.tier)
        );
    }
}

/// Interactive draft session against the shared SQLite pick log.
///
/// Commits and undos go through the engine; the committed events are
/// replayed through the draft feed, which recomputes and prints the turn
/// state after each change (the same path a remote observer would use).
async fn cmd_draft(engine: &DraftEngine, log: &SqlitePickLog) -> anyhow::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<DraftEvent>(64);
    let (update_tx, mut update_rx) = mpsc::channel::<feed::DraftUpdate>(64);

    let printer = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            let percent = draft_progress(update.picks_made, update.total_picks);
            match (&update.on_clock, update.next_pick_number) {
                (Some(player), Some(number)) => println!(
                    "[{}/{} {percent:>3}%] pick {}: {} on the clock, {} drivers available",
                    update.picks_made, update.total_picks, number, player, update.remaining
                ),
                _ => println!(
                    "[{}/{} {percent:>3}%] draft complete",
                    update.picks_made, update.total_picks
                ),
            }
        }
    });

    // `move` so the event sender is owned (and dropped) by this future;
    // the feed loop ends when the sender side closes.
    let input = async move {
        println!("commands: pick <team> <driver>, undo, status, quit");

        // Replay picks from previous sessions so the feed view catches up.
        for pick in log.picks()? {
            send_event(&event_tx, DraftEvent::PickCommitted(pick)).await?;
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                ["pick", team, driver] => {
                    let picks = log.picks()?;
                    let Some(turn) = engine.current_pick(&picks) else {
                        println!("draft is complete");
                        continue;
                    };
                    let request = PickRequest {
                        player_id: team_id(team),
                        driver_id: driver.to_uppercase(),
                        pick_number: turn.pick_number,
                    };
                    match engine.commit_pick(log, &request) {
                        Ok(pick) => {
                            println!(
                                "pick {}: {} takes {} (P{})",
                                pick.pick_number, team, pick.driver_name, pick.start_position
                            );
                            send_event(&event_tx, DraftEvent::PickCommitted(pick)).await?;
                        }
                        Err(e) => println!("rejected: {e}"),
                    }
                }
                ["undo"] => match engine.undo_last(log) {
                    Ok(pick) => {
                        println!("undid pick {} ({})", pick.pick_number, pick.driver_name);
                        send_event(&event_tx, DraftEvent::PickUndone).await?;
                    }
                    Err(e) => println!("{e}"),
                },
                ["status"] => print_status(engine, log)?,
                ["quit"] | ["exit"] => break,
                [] => {}
                _ => println!("unrecognized command"),
            }
        }
        anyhow::Ok(())
    };

    // The feed task ends once the input side drops its event sender.
    let (applied, input_result) = tokio::join!(feed::run(engine, event_rx, update_tx), input);
    input_result?;
    printer.await.ok();

    info!(picks = applied.len(), "draft session ended");
    Ok(())
}

async fn send_event(
    event_tx: &mpsc::Sender<DraftEvent>,
    event: DraftEvent,
) -> anyhow::Result<()> {
    event_tx
        .send(event)
        .await
        .map_err(|_| anyhow::anyhow!("draft feed closed unexpectedly"))
}

fn print_status(engine: &DraftEngine, log: &SqlitePickLog) -> anyhow::Result<()> {
    let picks = log.picks()?;
    match engine.current_pick(&picks) {
        Some(turn) => {
            let on_clock = engine.roster().player_at(turn.slot_index);
            println!(
                "pick {} of {}: {} on the clock",
                turn.pick_number, turn.total_picks, on_clock.display_name
            );
        }
        None => println!("draft complete ({} picks)", picks.len()),
    }

    for player in engine.roster().iter() {
        let team: Vec<String> = engine
            .player_picks(&picks, &player.id)
            .iter()
            .map(|p| format!("{} (P{})", p.driver_id, p.start_position))
            .collect();
        println!("  {:<20} {}", player.display_name, team.join(", "));
    }

    let available: Vec<&str> = engine
        .available(&picks)
        .iter()
        .map(|d| d.id.as_str())
        .collect();
    println!("available: {}", available.join(" "));
    Ok(())
}

/// Row shape for a results CSV: `code,finish,fastest_lap`, where `finish`
/// is a 1-based position or the literal `DNF`, and `fastest_lap` is
/// optional (any non-empty value marks the driver).
#[derive(Debug, serde::Deserialize)]
struct ResultRow {
    code: String,
    finish: String,
    #[serde(default)]
    fastest_lap: String,
}

/// Score a race from a results CSV and record the per-player totals.
fn cmd_score(
    engine: &DraftEngine,
    db: &Database,
    log: &SqlitePickLog,
    args: &[String],
) -> anyhow::Result<()> {
    let [race_number, race_name, csv_path] = args else {
        bail!("usage: gridpick score <race-number> <race-name> <results.csv>");
    };
    let race_number: u32 = race_number
        .parse()
        .context("race number must be an integer")?;
    let race_id = format!("r{race_number:02}");

    let picks = log.picks()?;
    if engine.phase(&picks) != DraftPhase::Complete {
        bail!("draft is not complete yet; score races after the last pick is in");
    }

    let field_size = engine.grid().len() as u32;
    let mut classification = read_results_csv(csv_path, field_size)?;

    // Every drafted driver needs an outcome before totals are final.
    let drafted: Vec<&str> = picks.iter().map(|p| p.driver_id.as_str()).collect();
    classification
        .finalize(drafted)
        .context("results are incomplete for the drafted field")?;
    db.save_classification(&race_id, &classification)?;

    println!("{race_name} (race {race_number})");
    for player in engine.roster().iter() {
        let score = score_player(&player.id, &picks, &classification);
        println!("  {:<20} {:+} pts", player.display_name, score.total);
        for result in &score.driver_results {
            let line = result
                .score
                .map(|s| {
                    format!(
                        "{:+} (movement {:+}, bonus {:+}, fastest lap {:+})",
                        s.total, s.movement_points, s.finish_bonus, s.fastest_lap_points
                    )
                })
                .unwrap_or_else(|| "pending".to_string());
            let finish = result
                .outcome
                .map(|o| o.to_string())
                .unwrap_or_else(|| "--".to_string());
            println!(
                "    {:<4} P{:<3} -> {:<4} {}",
                result.driver_id, result.start_position, finish, line
            );
        }
        db.record_race_score(&RaceScore {
            race_id: race_id.clone(),
            race_name: race_name.clone(),
            race_number,
            player_id: player.id.clone(),
            points: score.total,
        })?;
    }

    info!(race_id, race_number, "race scored");
    Ok(())
}

fn read_results_csv(path: &str, field_size: u32) -> anyhow::Result<RaceClassification> {
    let mut reader =
        csv::Reader::from_path(path).with_context(|| format!("failed to open {path}"))?;

    let mut classification = RaceClassification::new();
    for row in reader.deserialize::<ResultRow>() {
        let row = row.with_context(|| format!("bad results row in {path}"))?;
        let outcome = if row.finish.eq_ignore_ascii_case("dnf") {
            FinishOutcome::Dnf
        } else {
            let position: u32 = row
                .finish
                .parse()
                .with_context(|| format!("bad finish `{}` for {}", row.finish, row.code))?;
            FinishOutcome::from_position(position, field_size)
        };
        let code = row.code.to_uppercase();
        classification.set_outcome(&code, outcome)?;
        if !row.fastest_lap.trim().is_empty() {
            classification.set_fastest_lap(Some(&code))?;
        }
    }
    Ok(classification)
}

/// Print the season standings table.
fn cmd_standings(engine: &DraftEngine, db: &Database) -> anyhow::Result<()> {
    let scores = db.load_race_scores()?;
    let standings = season_standings(engine.roster(), &scores);

    println!(
        "{:<4} {:<20} {:>6}  {:>5}",
        "", "team", "pts", "races"
    );
    for (idx, standing) in standings.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:>6}  {:>5}",
            idx + 1,
            standing.player_name,
            standing.total_points,
            standing.races_completed
        );
        for race in &standing.breakdown {
            println!("       {:<18} {:>5}", race.race_name, race.points);
        }
    }
    Ok(())
}

/// Initialize tracing to a log file so stdout stays clean for command
/// output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("gridpick.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gridpick=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
