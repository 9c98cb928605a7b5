//! EloVe CLI
//!
//! Usage:
//!   elove create-profile --name Ann --age 30 --photo me.b64   # Onboard
//!   elove swipe                                               # Interactive swipe session
//!   elove photos                                              # Interactive photo manager
//!   elove leaderboard | stats | matches | history             # Read-only views
//!   elove --offline swipe                                     # Against sample data, no server

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use elove::config::ClientConfig;
use elove::core::{
    create_profile, FileStore, HttpService, Identity, KeyValueStore, MemoryService, MemoryStore,
    PhotoReconciler, RemoteService, SwipeSession,
};
use elove::types::{Candidate, Direction, EncodedImage, NewProfile, QueueState, ValidationError};
use elove::{CURRENT_USER_KEY, HISTORY_DEFAULT_LIMIT, VERSION};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "elove",
    version = VERSION,
    about = "EloVe - rate profiles, climb the Elo ladder",
    long_about = "Terminal client for the EloVe backend.\n\n\
                  Swipe session commands:\n  \
                  drag <dx> [dy]  Drag the card; beyond 30% of the width opens a decision\n  \
                  like | pass     Open a decision directly\n  \
                  rate <1-10>     Adjust the rating of the open decision\n  \
                  preview         Projected Elo impact of the open decision\n  \
                  confirm         Submit the open decision\n  \
                  cancel          Drop the open decision, card back at rest\n\n\
                  Queue states:\n  \
                  EMPTY       - Nothing to show (use 'refresh')\n  \
                  LOADING     - Fetching the next batch\n  \
                  PRESENTING  - A candidate is on screen\n  \
                  ADVANCING   - Moving past a rated candidate"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ~/.elove/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend API root, overrides the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Use built-in sample data instead of a server
    #[arg(long, global = true)]
    offline: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    no_color: bool,

    /// Debug logging
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create your profile and upload its first photos
    CreateProfile {
        #[arg(long)]
        name: String,
        #[arg(long)]
        age: u32,
        #[arg(long, default_value = "")]
        bio: String,
        /// File holding base64-encoded JPEG data (repeatable)
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    /// Show the stored identity
    Whoami,
    /// Forget the stored identity
    Logout,
    /// Interactive swipe session
    Swipe,
    /// Interactive photo manager
    Photos,
    /// Top profiles by Elo
    Leaderboard,
    /// App-wide stats, or your own with a profile
    Stats,
    /// Your mutual matches
    Matches,
    /// Ratings you gave and received
    History {
        #[arg(long, default_value_t = HISTORY_DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Check the backend is reachable
    Health,
}

/// Service and identity store chosen from the flags
struct Context {
    service: Arc<dyn RemoteService>,
    store: Box<dyn KeyValueStore>,
    config: ClientConfig,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    if args.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(&args).await {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: &Args) -> CliResult {
    let ctx = build_context(args)?;
    match &args.command {
        Command::CreateProfile {
            name,
            age,
            bio,
            photos,
        } => run_create_profile(&ctx, args, name, *age, bio, photos).await,
        Command::Whoami => run_whoami(&ctx, args).await,
        Command::Logout => {
            Identity::new(ctx.store.as_ref()).forget()?;
            println!("Logged out.");
            Ok(())
        }
        Command::Swipe => run_swipe(&ctx, args).await,
        Command::Photos => run_photos(&ctx, args).await,
        Command::Leaderboard => run_leaderboard(&ctx, args).await,
        Command::Stats => run_stats(&ctx, args).await,
        Command::Matches => run_matches(&ctx, args).await,
        Command::History { limit } => run_history(&ctx, args, *limit).await,
        Command::Health => {
            let message = ctx.service.health().await?;
            println!("{}", message.green());
            Ok(())
        }
    }
}

fn build_context(args: &Args) -> Result<Context, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load()?,
    };
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }

    if args.offline {
        let service = MemoryService::with_sample_users();
        let store = MemoryStore::new();
        if let Some(first) = service.user_ids().first() {
            store.set(CURRENT_USER_KEY, first)?;
        }
        return Ok(Context {
            service: Arc::new(service),
            store: Box::new(store),
            config,
        });
    }

    let identity_path = config
        .identity_file()
        .ok_or("cannot determine home directory for the identity file")?;
    Ok(Context {
        service: Arc::new(HttpService::from_config(&config)?),
        store: Box::new(FileStore::new(identity_path)),
        config,
    })
}

fn require_user(ctx: &Context) -> Result<String, Box<dyn std::error::Error>> {
    Identity::new(ctx.store.as_ref())
        .current_user()?
        .ok_or_else(|| ValidationError::NoIdentity.into())
}

fn emit<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_photo(path: &Path) -> Result<EncodedImage, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    Ok(EncodedImage::jpeg(text.trim()))
}

/// Read one trimmed line; `None` on EOF
fn prompt_line(prompt: &str) -> Option<String> {
    print!("{}", prompt);
    io::stdout().flush().ok()?;
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn print_header(mode: &str) {
    println!();
    println!("{}", format!("=== EloVe v{} - {} ===", VERSION, mode).bold());
    println!();
}

// =============================================================================
// PROFILE
// =============================================================================

async fn run_create_profile(
    ctx: &Context,
    args: &Args,
    name: &str,
    age: u32,
    bio: &str,
    photo_paths: &[PathBuf],
) -> CliResult {
    let photos = photo_paths
        .iter()
        .map(|p| read_photo(p))
        .collect::<Result<Vec<_>, _>>()?;
    let profile = NewProfile::new(name, age).with_bio(bio);

    let report = create_profile(ctx.service.as_ref(), ctx.store.as_ref(), profile, photos).await?;
    if args.json {
        return emit(&report);
    }
    println!("{}", report.welcome().green().bold());
    println!("Photos uploaded: {}", report.uploaded.len());
    if !report.failed.is_empty() {
        println!(
            "{}",
            format!("{} photo(s) failed to upload; add them again from 'elove photos'", report.failed.len())
                .yellow()
        );
    }
    Ok(())
}

async fn run_whoami(ctx: &Context, args: &Args) -> CliResult {
    let Some(user_id) = Identity::new(ctx.store.as_ref()).current_user()? else {
        println!("No profile yet. Run 'elove create-profile'.");
        return Ok(());
    };
    let user = ctx.service.get_user(&user_id).await?;
    if args.json {
        return emit(&user);
    }
    println!("{} [{}]", user.headline().bold(), user.id);
    if !user.bio.is_empty() {
        println!("  {}", user.bio);
    }
    Ok(())
}

// =============================================================================
// SWIPE
// =============================================================================

fn print_card(candidate: Option<&Candidate>, state: QueueState, args: &Args) {
    let color = if args.no_color { "" } else { state.color_code() };
    let reset = if args.no_color { "" } else { QueueState::color_reset() };
    match candidate {
        Some(c) => {
            println!("{}[{}]{} {}", color, state, reset, c.headline().bold());
            if !c.bio.is_empty() {
                println!("  {}", c.bio.dimmed());
            }
        }
        None => {
            println!("{}[{}]{} No more profiles to show. Try 'refresh' later.", color, state, reset);
        }
    }
}

async fn run_swipe(ctx: &Context, args: &Args) -> CliResult {
    let rater = require_user(ctx)?;
    let session = SwipeSession::from_config(ctx.service.clone(), rater, &ctx.config);

    print_header("Swipe");
    println!("Commands: drag <dx> [dy], like, pass, rate <n>, preview, confirm, cancel, status, refresh, quit");
    println!();

    if let Err(e) = session.refresh().await {
        println!("{} {}", "Failed to load users:".red(), e.info().message);
    }
    print_card(session.current().as_ref(), session.state(), args);

    while let Some(line) = prompt_line(&format!("{}> ", session.state())) {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command.to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "status" => {
                let snapshot = session.snapshot();
                if args.json {
                    emit(&snapshot)?;
                } else {
                    print_card(snapshot.current.as_ref(), snapshot.state, args);
                    if let Some(intent) = &snapshot.pending {
                        println!("  pending: {} at {}", intent.direction, intent.rating);
                    }
                    if let Some(cursor) = snapshot.cursor {
                        println!("  card {} of {}", cursor + 1, snapshot.batch_len);
                    }
                }
            }
            "drag" => {
                let dx: f64 = match words.next().map(str::parse::<f64>) {
                    Some(Ok(v)) => v,
                    _ => {
                        println!("{}", "usage: drag <dx> [dy]".yellow());
                        continue;
                    }
                };
                let dy: f64 = words.next().and_then(|w| w.parse().ok()).unwrap_or(0.0);
                if !session.drag_start() {
                    println!("{}", "Nothing to drag right now.".yellow());
                    continue;
                }
                let transform = session.drag_move(dx, dy);
                match session.drag_end(dx, dy) {
                    Ok(Some(intent)) => println!(
                        "{} (tilt {:.1}°). Rate it with 'rate <n>', then 'confirm' or 'cancel'.",
                        intent.direction.to_string().bold(),
                        transform.rotation_deg
                    ),
                    Ok(None) => println!("Snapped back (tilt was {:.1}°).", transform.rotation_deg),
                    Err(e) => println!("{}", e.to_string().yellow()),
                }
            }
            "like" | "pass" => {
                let direction = if command.eq_ignore_ascii_case("like") {
                    Direction::Like
                } else {
                    Direction::Pass
                };
                match session.action(direction) {
                    Ok(intent) => println!(
                        "{} at {}. 'rate <n>' to adjust, then 'confirm' or 'cancel'.",
                        intent.direction.to_string().bold(),
                        intent.rating
                    ),
                    Err(e) => println!("{}", e.to_string().yellow()),
                }
            }
            "rate" => match words.next().and_then(|w| w.parse::<i64>().ok()) {
                Some(value) => match session.set_rating(value) {
                    Ok(()) => println!("Rating set to {}/10.", value),
                    Err(e) => println!("{}", e.to_string().yellow()),
                },
                None => println!("{}", "usage: rate <1-10>".yellow()),
            },
            "preview" => match session.preview().await {
                Ok(preview) if args.json => emit(&preview)?,
                Ok(preview) => {
                    println!(
                        "Your Elo {:.0} → {:.0} ({:+.1}), theirs {:.0} → {:.0} ({:+.1})",
                        preview.current_rater_rating,
                        preview.projected_rater_rating,
                        preview.rater_change,
                        preview.current_rated_rating,
                        preview.projected_rated_rating,
                        preview.rated_change
                    );
                    if !preview.impact_description.is_empty() {
                        println!("  {}", preview.impact_description.dimmed());
                    }
                }
                Err(e) => println!("{}", e.info().message.yellow()),
            },
            "confirm" => match session.confirm().await {
                Ok(report) => {
                    if args.json {
                        emit(&report)?;
                    } else {
                        let message = report.message();
                        if report.outcome.mutual_match {
                            println!("{}", message.magenta().bold());
                        } else {
                            println!("{}", message.green());
                        }
                        if let Some(err) = &report.refill_error {
                            println!("{} {}", "Failed to load more users:".red(), err.message);
                        }
                    }
                    print_card(session.current().as_ref(), session.state(), args);
                }
                Err(e) if e.is_local() => println!("{}", e.to_string().yellow()),
                Err(e) => {
                    println!("{} {}", "Failed to submit rating:".red(), e.info().message);
                    println!("The card is still here; decide again to retry.");
                }
            },
            "cancel" => match session.cancel() {
                Ok(Some(_)) => println!("Cancelled. Card back in place."),
                Ok(None) => println!("Nothing to cancel."),
                Err(e) => println!("{}", e.to_string().yellow()),
            },
            "refresh" => {
                match session.refresh().await {
                    Ok(count) => println!("Loaded {} profiles.", count),
                    Err(e) => println!("{} {}", "Failed to load users:".red(), e.info().message),
                }
                print_card(session.current().as_ref(), session.state(), args);
            }
            other => println!("{}", format!("unknown command: {}", other).yellow()),
        }
    }
    println!("\nSession ended.");
    Ok(())
}

// =============================================================================
// PHOTOS
// =============================================================================

fn print_photos<S: RemoteService + ?Sized>(photos: &PhotoReconciler<S>, args: &Args) -> CliResult {
    if args.json {
        return emit(&photos.photos());
    }
    if photos.is_empty() {
        println!("No photos. Add one with 'add <file>'.");
        return Ok(());
    }
    for (i, photo) in photos.photos().iter().enumerate() {
        let mut line = format!("{:>2}. {} {}", i + 1, photo.id, photo.uri.dimmed());
        if i == 0 {
            line.push_str(&format!(" {}", "MAIN".green().bold()));
        }
        if photo.is_new {
            line.push_str(&format!(" {}", "NEW".cyan()));
        }
        println!("{}", line);
    }
    println!("{}/{} photos, {} not uploaded", photos.len(), photos.cap(), photos.new_count());
    Ok(())
}

async fn run_photos(ctx: &Context, args: &Args) -> CliResult {
    let owner = require_user(ctx)?;
    let mut photos = PhotoReconciler::with_cap(ctx.service.clone(), ctx.config.max_photos);

    print_header("Photos");
    println!("Commands: list, add <file>, remove <id>, main <id>, commit, reload, quit");
    println!();

    match photos.load_all(&owner).await {
        Ok(_) => print_photos(&photos, args)?,
        Err(e) => println!("{} {}", "Failed to load photos:".red(), e.info().message),
    }

    while let Some(line) = prompt_line("photos> ") {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let arg = words.next();

        match (command.to_ascii_lowercase().as_str(), arg) {
            ("quit" | "exit", _) => break,
            ("list", _) => print_photos(&photos, args)?,
            ("add", Some(file)) => {
                let path = PathBuf::from(file);
                match read_photo(&path) {
                    Ok(image) => match photos.add_local(format!("file://{}", path.display()), image) {
                        Ok(photo) => println!("Added {}.", photo.id),
                        Err(e) => println!("{}", e.to_string().yellow()),
                    },
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
            ("remove", Some(id)) => match photos.remove(&owner, id).await {
                Ok(photo) => println!("Removed {}.", photo.id),
                Err(e) => println!("{} {}", "Failed to delete photo:".red(), e.info().message),
            },
            ("main", Some(id)) => match photos.set_main(&owner, id).await {
                Ok(()) => println!("{} is now your main photo.", id),
                Err(e) => println!("{} {}", "Failed to set main photo:".red(), e.info().message),
            },
            ("commit", _) => match photos.commit_new_photos(&owner).await {
                Ok(report) if args.json => emit(&report)?,
                Ok(report) if report.total() == 0 => println!("Nothing to upload."),
                Ok(report) => {
                    println!("{}", format!("{} uploaded", report.uploaded_count).green());
                    if report.failed_count > 0 {
                        println!("{}", format!("{} failed to upload:", report.failed_count).red());
                        for item in &report.failed_items {
                            println!("  {} {}", item.local_id, item.error.message);
                        }
                    }
                    if let Some(err) = &report.reload_error {
                        println!("{} {}", "Reload failed, list may be stale:".yellow(), err.message);
                    }
                    print_photos(&photos, args)?;
                }
                Err(e) => println!("{} {}", "Failed to save photos:".red(), e.info().message),
            },
            ("reload", _) => match photos.load_all(&owner).await {
                Ok(_) => print_photos(&photos, args)?,
                Err(e) => println!("{} {}", "Failed to load photos:".red(), e.info().message),
            },
            (other, None) if matches!(other, "add" | "remove" | "main") => {
                println!("{}", format!("usage: {} <arg>", other).yellow())
            }
            (other, _) => println!("{}", format!("unknown command: {}", other).yellow()),
        }
    }
    if photos.new_count() > 0 {
        println!("{}", format!("{} photo(s) were never uploaded.", photos.new_count()).yellow());
    }
    Ok(())
}

// =============================================================================
// READ-ONLY VIEWS
// =============================================================================

async fn run_leaderboard(ctx: &Context, args: &Args) -> CliResult {
    let entries = ctx.service.leaderboard().await?;
    if args.json {
        return emit(&entries);
    }
    print_header("Leaderboard");
    for entry in entries {
        println!(
            "{:>3}. {:<16} {:>3}  {:>7.1}  {}",
            entry.rank,
            entry.name,
            entry.age,
            entry.elo_rating,
            entry.tier.dimmed()
        );
    }
    Ok(())
}

async fn run_stats(ctx: &Context, args: &Args) -> CliResult {
    let user_id = Identity::new(ctx.store.as_ref()).current_user()?;
    let app = ctx.service.app_stats().await?;
    let mine = match &user_id {
        Some(id) => Some(ctx.service.user_stats(id).await?),
        None => None,
    };

    if args.json {
        #[derive(Serialize)]
        struct StatsOutput<'a> {
            app: &'a elove::types::AppStats,
            user: Option<&'a elove::types::UserStatsReport>,
        }
        return emit(&StatsOutput {
            app: &app,
            user: mine.as_ref(),
        });
    }

    print_header("Stats");
    println!("Users: {}", app.total_users);
    println!(
        "Elo: avg {:.1}, high {:.1}, low {:.1}",
        app.average_elo, app.highest_elo, app.lowest_elo
    );
    if let Some(report) = mine {
        let s = &report.stats;
        println!();
        println!("{} ({})", report.user.headline().bold(), report.attractiveness_tier);
        println!(
            "  given:    {} ratings, avg {:.1}, {:.0}% likes",
            s.total_ratings_given, s.average_rating_given, s.match_rate_given
        );
        println!(
            "  received: {} ratings, avg {:.1}, {:.0}% likes",
            s.total_ratings_received, s.average_rating_received, s.match_rate_received
        );
    }
    Ok(())
}

async fn run_matches(ctx: &Context, args: &Args) -> CliResult {
    let user_id = require_user(ctx)?;
    let matches = ctx.service.user_matches(&user_id).await?;
    if args.json {
        return emit(&matches);
    }
    if matches.is_empty() {
        println!("No matches yet. Keep swiping!");
        return Ok(());
    }
    for m in &matches {
        let partner = m.partner_of(&user_id);
        let name = match ctx.service.get_user(partner).await {
            Ok(user) => user.name,
            Err(_) => partner.to_string(),
        };
        println!("{} {}", name.magenta().bold(), m.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed());
    }
    Ok(())
}

async fn run_history(ctx: &Context, args: &Args, limit: usize) -> CliResult {
    let user_id = require_user(ctx)?;
    let history = ctx.service.rating_history(&user_id, limit).await?;
    if args.json {
        return emit(&history);
    }
    for entry in &history {
        let (arrow, other) = match entry.kind {
            elove::types::HistoryKind::Given => ("→", &entry.rated_id),
            elove::types::HistoryKind::Received => ("←", &entry.rater_id),
        };
        let verdict = if entry.is_match { "like".green() } else { "pass".red() };
        println!(
            "{} {} {} {:>2}/10 {}",
            entry.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            arrow,
            other,
            entry.rating,
            verdict
        );
    }
    Ok(())
}
