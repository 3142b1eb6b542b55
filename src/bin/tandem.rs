//! tandem CLI: operator and debugging interface to a couple's journal.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use secrecy::ExposeSecret;

use tandem_rs::backend::{Backend, RemoteBackend};
use tandem_rs::category::CategoryCatalog;
use tandem_rs::config::Config;
use tandem_rs::db::Db;
use tandem_rs::engine::{Dashboard, Journal, MemoryDraft, TaskBoard, views};
use tandem_rs::geo::convert_katech;
use tandem_rs::model::{
    CoupleId, EventId, EventPatch, GeoPoint, Session, TimelineEvent, UserId,
};
use tandem_rs::place::{NaverLocalSearch, PlaceSearch};
use tandem_rs::search::search_events;
use tandem_rs::storage::ImageStore;
use tandem_rs::telemetry::{TelemetryConfig, TelemetryGuard, init_telemetry};
use tandem_rs::timeline::{MonthKey, day_key};

#[derive(Parser)]
#[command(name = "tandem", about = "A shared journal for two")]
struct Cli {
    /// Signed-in user id
    #[arg(long, global = true)]
    user: Option<String>,
    /// Couple id
    #[arg(long, global = true)]
    couple: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply database migrations
    Migrate,
    /// List memories, newest first
    Timeline {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show a month with day marks
    Calendar {
        year: i32,
        month: u32,
        /// Selected day of month (defaults to the 1st)
        #[arg(long)]
        day: Option<u32>,
    },
    /// Show image memories grouped by month
    Gallery {
        /// Images per row (defaults to GALLERY_COLUMNS)
        #[arg(long)]
        columns: Option<usize>,
    },
    /// Show totals and most frequent places and categories
    Stats {
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Search memories by text
    Search { query: String },
    /// Shared task list
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Memory records
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
    /// Couple profile
    Couple {
        #[command(subcommand)]
        action: CoupleAction,
    },
    /// Look up places by name
    Place { query: String },
    /// Convert a place-search coordinate pair to WGS84
    Convert { east: String, north: String },
    /// Load the home screen
    Dashboard {
        #[arg(long, default_value_t = 3)]
        top: usize,
    },
}

#[derive(Subcommand)]
enum TaskAction {
    List,
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Toggle completion (full id or prefix)
    Toggle { id: String },
    /// Delete (full id or prefix)
    Delete { id: String },
}

#[derive(Subcommand)]
enum EventAction {
    /// Record a new memory
    Add {
        #[arg(long)]
        image: PathBuf,
        /// Date of the memory (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Change fields of a memory
    Edit {
        id: String,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, requires = "lon")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lon: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "keyword")]
        keywords: Vec<String>,
        #[arg(long)]
        rating: Option<f64>,
    },
    /// Delete a memory and its photo
    Delete { id: String },
    Show { id: String },
}

#[derive(Subcommand)]
enum CoupleAction {
    Show,
    /// Set the day you first met (YYYY-MM-DD)
    FirstMet { date: NaiveDate },
}

struct App {
    config: Config,
    backend: Arc<dyn Backend>,
    _telemetry: TelemetryGuard,
}

impl App {
    async fn start(migrate: bool) -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        let telemetry = init_telemetry(TelemetryConfig {
            endpoint: config.otel_endpoint.clone(),
            service_name: "tandem".to_string(),
            log_level: config.log_level.clone(),
        })?;

        let db = Db::connect(config.database_url.expose_secret()).await?;
        if migrate {
            db.migrate().await?;
        }
        let images = ImageStore::new(config.storage_dir.clone(), config.storage_public_url.clone());
        Ok(Self {
            backend: Arc::new(RemoteBackend::new(db, images)),
            config,
            _telemetry: telemetry,
        })
    }

    fn catalog(&self) -> anyhow::Result<CategoryCatalog> {
        Ok(self.config.category_catalog()?)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Command::Convert { ref east, ref north } => {
            let conversion = convert_katech(east.as_str(), north.as_str());
            println!(
                "{:.7}, {:.7}  ({:?})",
                conversion.point.latitude, conversion.point.longitude, conversion.status
            );
            Ok(())
        }
        Command::Place { ref query } => cmd_place(query).await,
        Command::Migrate => {
            App::start(true).await?;
            println!("Migrations applied.");
            Ok(())
        }
        ref command => {
            let session = session(&cli)?;
            let app = App::start(false).await?;
            run(&app, &session, command).await
        }
    }
}

fn session(cli: &Cli) -> anyhow::Result<Session> {
    let (Some(user), Some(couple)) = (&cli.user, &cli.couple) else {
        anyhow::bail!("--user and --couple are required for this command");
    };
    Ok(Session::new(user.parse::<UserId>()?, couple.parse::<CoupleId>()?))
}

async fn run(app: &App, session: &Session, command: &Command) -> anyhow::Result<()> {
    let backend = app.backend.as_ref();
    match command {
        Command::Timeline { limit } => {
            let events = views::load_timeline(backend, session).await?;
            print_events(&events, *limit);
        }
        Command::Calendar { year, month, day } => {
            let month = MonthKey::new(*year, *month)?;
            let selected = match day {
                Some(d) => NaiveDate::from_ymd_opt(month.year, month.month, *d)
                    .ok_or_else(|| anyhow::anyhow!("{month} has no day {d}"))?,
                None => month.first_day()?,
            };
            let view = views::load_month_view(backend, session, month, selected).await?;
            println!("{}", view.month());
            for (day, mark) in view.marks() {
                let flags = match (mark.has_events, mark.selected) {
                    (true, true) => "● selected",
                    (true, false) => "●",
                    (false, true) => "  selected",
                    (false, false) => "",
                };
                println!("  {day}  {flags}");
            }
            println!("--- {} ---", day_key(view.selected()));
            for event in view.selected_events() {
                println!("  {}", summary(event));
            }
        }
        Command::Gallery { columns } => {
            let columns = columns.unwrap_or(app.config.gallery_columns);
            for section in views::load_gallery(backend, session, columns).await? {
                println!("{} ({} photos)", section.key, section.len());
                for row in &section.rows {
                    let cells: Vec<String> = row
                        .iter()
                        .map(|e| {
                            e.image_path
                                .as_deref()
                                .map(|p| backend.public_url(p))
                                .unwrap_or_default()
                        })
                        .collect();
                    println!("  {}", cells.join("  "));
                }
            }
        }
        Command::Stats { top } => {
            let stats = views::load_stats(backend, session, *top).await?;
            let catalog = app.catalog()?;
            println!("Memories:  {}", stats.total);
            if let Some(latest) = stats.latest_event_date {
                println!("Latest:    {}", latest.format("%Y-%m-%d"));
            }
            println!("Top places:");
            for entry in &stats.top_locations {
                println!("  {:<30} {}", entry.value, entry.count);
            }
            println!("Top categories:");
            for entry in &stats.top_categories {
                println!("  {:<30} {}", catalog.display_label(&entry.value), entry.count);
            }
        }
        Command::Search { query } => {
            let events = views::load_timeline(backend, session).await?;
            let catalog = app.catalog()?;
            let state = search_events(&events, query, &catalog);
            let matches = state.events();
            if matches.is_empty() {
                println!("No memories match '{query}'.");
            } else {
                print_events(matches, matches.len());
            }
        }
        Command::Task { action } => cmd_task(app, session, action).await?,
        Command::Event { action } => cmd_event(app, session, action).await?,
        Command::Couple { action } => {
            let journal = Journal::new(Arc::clone(&app.backend), *session);
            let couple = match action {
                CoupleAction::Show => journal.couple().await?,
                CoupleAction::FirstMet { date } => journal.set_first_met_date(*date).await?,
            };
            let me = journal.me().await?;
            let partner = journal.partner().await?;
            println!("Couple:     {}", couple.id);
            println!("Invite:     {}", couple.invite_code);
            println!("Me:         {}", me.display_name());
            println!(
                "Partner:    {}",
                partner.as_ref().map_or("(not joined yet)", |p| p.display_name())
            );
            match (couple.first_met_date, couple.days_together(Utc::now().date_naive())) {
                (Some(first), Some(days)) => println!("First met:  {first} (D+{days})"),
                (Some(first), None) => println!("First met:  {first}"),
                _ => println!("First met:  -"),
            }
        }
        Command::Dashboard { top } => {
            let dashboard = Dashboard::load(backend, session, *top).await;
            match dashboard.couple.as_ref() {
                Some(couple) => match couple.days_together(Utc::now().date_naive()) {
                    Some(days) => println!("D+{days}"),
                    None => println!("Couple {}", couple.id),
                },
                None => println!("Couple: unavailable"),
            }
            if let Some(ref stats) = dashboard.stats {
                println!(
                    "{} memories, favourite place: {}",
                    stats.total,
                    stats.top_location().map_or("-", |e| e.value.as_str())
                );
            }
            println!("Recent:");
            print_events(&dashboard.events, 3);
            let open = dashboard.tasks.iter().filter(|t| !t.completed).count();
            println!("Tasks: {open} open of {}", dashboard.tasks.len());
            for failure in &dashboard.failures {
                eprintln!("warning: {} unavailable: {}", failure.leg, failure.notice);
            }
        }
        Command::Migrate | Command::Place { .. } | Command::Convert { .. } => {}
    }
    Ok(())
}

async fn cmd_task(app: &App, session: &Session, action: &TaskAction) -> anyhow::Result<()> {
    let board = TaskBoard::new(Arc::clone(&app.backend), session);
    board.load().await?;

    match action {
        TaskAction::List => {}
        TaskAction::Add { text } => {
            let mut input = text.join(" ");
            let task = board.create(&mut input).await?;
            println!("Created: {}", task.id);
        }
        TaskAction::Toggle { id } => {
            let id = resolve_prefix(id, board.tasks().iter().map(|t| t.id))?;
            board.toggle(id).await?;
        }
        TaskAction::Delete { id } => {
            let id = resolve_prefix(id, board.tasks().iter().map(|t| t.id))?;
            board.delete(id).await?;
            println!("Deleted: {id}");
        }
    }

    let (done, total) = board.progress();
    for task in board.tasks() {
        let mark = if task.completed { "x" } else { " " };
        println!("[{mark}] {}  {}", &task.id.to_string()[..8], task.text);
    }
    println!("\n{done}/{total} done");
    Ok(())
}

async fn cmd_event(app: &App, session: &Session, action: &EventAction) -> anyhow::Result<()> {
    let journal = Journal::new(Arc::clone(&app.backend), *session);

    match action {
        EventAction::Add {
            image,
            date,
            description,
            location,
            lat,
            lon,
            category,
            keywords,
            rating,
        } => {
            let draft = MemoryDraft {
                image: Some(image.clone()),
                event_date: date.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
                description: description.clone(),
                location: location.clone(),
                point: lat.zip(*lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
                category: category.clone(),
                keywords: keywords.clone(),
                rating: *rating,
            };
            let event = journal.record(&draft).await?;
            println!("Created: {}", event.id);
        }
        EventAction::Edit {
            id,
            date,
            description,
            location,
            lat,
            lon,
            category,
            keywords,
            rating,
        } => {
            let id = resolve_event(app, session, id).await?;
            let patch = EventPatch {
                description: description.clone(),
                event_date: date.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
                location: location.clone(),
                point: lat.zip(*lon).map(|(lat, lon)| GeoPoint::new(lat, lon)),
                category: category.clone(),
                keywords: (!keywords.is_empty()).then(|| keywords.clone()),
                rating: *rating,
            };
            journal.edit(id, patch).await?;
            println!("Updated: {id}");
        }
        EventAction::Delete { id } => {
            let id = resolve_event(app, session, id).await?;
            let event = journal.event(id).await?;
            journal.delete(&event).await?;
            println!("Deleted: {id}");
        }
        EventAction::Show { id } => {
            let id = resolve_event(app, session, id).await?;
            let event = journal.event(id).await?;
            let catalog = app.catalog()?;
            println!("ID:          {}", event.id);
            println!("Date:        {}", event.event_date.format("%Y-%m-%d"));
            println!("Description: {}", event.description.as_deref().unwrap_or("-"));
            println!("Location:    {}", event.location.as_deref().unwrap_or("-"));
            if let Some(point) = event.point {
                println!("Point:       {:.6}, {:.6}", point.latitude, point.longitude);
            }
            println!(
                "Category:    {}",
                event
                    .category
                    .as_deref()
                    .map_or("-", |c| catalog.display_label(c))
            );
            println!("Keywords:    {}", event.unique_keywords().join(", "));
            println!(
                "Rating:      {}",
                event.rating.map(|r| r.to_string()).unwrap_or("-".to_string())
            );
            if let Some(ref path) = event.image_path {
                println!("Image:       {}", app.backend.public_url(path));
            }
        }
    }
    Ok(())
}

async fn cmd_place(query: &str) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let search = NaverLocalSearch::from_config(&config)?;
    let places = search.search(query).await?;
    if places.is_empty() {
        println!("No places found.");
    }
    for place in places {
        let point = place
            .point
            .map(|p| format!("{:.6}, {:.6}", p.latitude, p.longitude))
            .unwrap_or_else(|| "-".to_string());
        println!("{}  [{}]", place.title, place.category);
        println!("    {}  ({point})", place.address);
    }
    Ok(())
}

/// Accept a full id or an unambiguous prefix of one of `candidates`.
fn resolve_prefix<T>(input: &str, candidates: impl Iterator<Item = T>) -> anyhow::Result<T>
where
    T: std::fmt::Display + std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if input.len() >= 36 {
        return Ok(input.parse()?);
    }
    let mut matches: Vec<T> = candidates
        .filter(|c| c.to_string().starts_with(input))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("nothing matches prefix '{input}'"),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("{n} ids match prefix '{input}', be more specific"),
    }
}

async fn resolve_event(app: &App, session: &Session, input: &str) -> anyhow::Result<EventId> {
    if input.len() >= 36 {
        return Ok(input.parse()?);
    }
    let events = app.backend.list_events(session.couple_id).await?;
    resolve_prefix(input, events.iter().map(|e| e.id))
}

fn summary(event: &TimelineEvent) -> String {
    format!(
        "{}  {}  {}  {}",
        &event.id.to_string()[..8],
        event.event_date.format("%Y-%m-%d"),
        event.location.as_deref().unwrap_or("-"),
        event.description.as_deref().unwrap_or("")
    )
}

fn print_events(events: &[TimelineEvent], limit: usize) {
    if events.is_empty() {
        println!("No memories yet.");
        return;
    }
    for event in events.iter().take(limit) {
        println!("{}", summary(event));
    }
    if events.len() > limit {
        println!("... {} more", events.len() - limit);
    }
}
