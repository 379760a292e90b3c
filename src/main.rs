use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use shelfmark::catalog::CatalogError;
use shelfmark::db::models::Item;
use shelfmark::filter::FilterContext;
use shelfmark::nav::Location;
use shelfmark::poster::{NoPosters, PosterLookup, TmdbClient};
use shelfmark::prompt::{AssumeYes, Prompt, Terminal};
use shelfmark::selection::{Gesture, Outcome};
use shelfmark::session::Session;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "shelfmark", version, about = "Personal physical-media catalog")]
struct Cli {
    /// Path to the SQLite database
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Editable item fields. Omitted flags leave a field unchanged.
#[derive(Args, Default)]
struct ItemFields {
    #[arg(long)]
    title: Option<String>,
    /// Release year (0 clears it)
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long = "type")]
    media_type: Option<String>,
    #[arg(long)]
    format: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    runtime: Option<String>,
    #[arg(long)]
    audio: Option<String>,
    #[arg(long)]
    hdr: Option<String>,
    #[arg(long)]
    languages: Option<String>,
    #[arg(long)]
    subtitles: Option<String>,
    #[arg(long)]
    edition: Option<String>,
    /// Number of discs (0 clears it)
    #[arg(long)]
    discs: Option<i32>,
    #[arg(long)]
    barcode: Option<String>,
    #[arg(long)]
    packaging: Option<String>,
    /// Poster image URL
    #[arg(long)]
    poster: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    /// Custom field as KEY=VALUE (repeatable; an empty VALUE removes the field)
    #[arg(long = "custom", value_name = "KEY=VALUE")]
    custom: Vec<String>,
}

impl ItemFields {
    fn apply(self, item: &mut Item) -> Result<()> {
        let text = [
            (self.title, &mut item.title),
            (self.genre, &mut item.genre),
            (self.media_type, &mut item.media_type),
            (self.format, &mut item.format),
            (self.region, &mut item.region),
            (self.runtime, &mut item.runtime),
            (self.audio, &mut item.audio),
            (self.hdr, &mut item.hdr),
            (self.languages, &mut item.languages),
            (self.subtitles, &mut item.subtitles),
            (self.edition, &mut item.edition),
            (self.barcode, &mut item.barcode),
            (self.packaging, &mut item.packaging),
            (self.poster, &mut item.poster),
            (self.notes, &mut item.notes),
        ];
        for (value, field) in text {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(year) = self.year {
            item.year = Some(year);
        }
        if let Some(discs) = self.discs {
            item.discs = Some(discs);
        }
        for pair in self.custom {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Expected KEY=VALUE, got \"{pair}\""))?;
            if value.trim().is_empty() {
                item.custom.remove(key.trim());
            } else {
                item.custom.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog items, optionally filtered
    Browse {
        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        /// Only items of this type ("Unknown" for untyped items)
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
    },

    /// Show one item in full
    Show { id: i64 },

    /// Add a new item
    Add {
        #[command(flatten)]
        fields: ItemFields,
    },

    /// Edit an existing item
    Edit {
        id: i64,

        #[command(flatten)]
        fields: ItemFields,
    },

    /// Delete an item (and remove it from every list)
    Delete {
        id: i64,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Select several items and delete them
    Select {
        /// Select every item
        #[arg(long, conflicts_with_all = ["range", "ids"])]
        all: bool,

        /// Select every item between two ids in catalog order (inclusive)
        #[arg(long, num_args = 2, value_names = ["FROM", "TO"], conflicts_with = "ids")]
        range: Option<Vec<i64>>,

        /// Items to select
        #[arg(required_unless_present_any = ["all", "range"])]
        ids: Vec<i64>,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Show all lists
    Lists,

    /// Manage a list
    List {
        #[command(subcommand)]
        action: ListCommand,
    },

    /// Show catalog statistics, or the items of one type group
    Stats {
        /// Type group to drill into
        media_type: Option<String>,
    },

    /// Import a comma-separated collection export
    Import {
        file: PathBuf,

        /// Skip poster lookups
        #[arg(long)]
        no_posters: bool,
    },

    /// Show the distinct item types in use
    Types,
}

#[derive(Subcommand)]
enum ListCommand {
    /// Show a list's items and the items that could be added to it
    Show {
        id: i64,

        /// Search the items available to add
        #[arg(short, long)]
        query: Option<String>,

        /// Only offer items of this type
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
    },

    /// Create an empty list (asks for a name if none given)
    Create { name: Option<String> },

    /// Rename a list
    Rename { id: i64, name: String },

    /// Delete a list (its items are kept)
    Delete {
        id: i64,

        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Add an item to a list
    Add {
        item: i64,

        /// Existing list to add to
        #[arg(long, required_unless_present = "new", conflicts_with = "new")]
        to: Option<i64>,

        /// Create a new list holding the item (asks for a name if none given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        new: Option<String>,
    },

    /// Remove an item from a list
    Remove { list: i64, item: i64 },
}

fn prompt_for(yes: bool) -> Box<dyn Prompt> {
    if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(Terminal)
    }
}

/// Use `given` if non-blank, otherwise ask on the terminal.
fn list_name(given: Option<String>) -> Option<String> {
    match given {
        Some(name) if !name.trim().is_empty() => Some(name),
        _ => shelfmark::prompt::ask_name(&mut Terminal, "List name:"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = shelfmark::config::AppConfig::load();

    // Resolve database path: CLI > config > XDG default
    let db_path = config.resolve_db_path(cli.db_path);
    log::info!("Database: {}", db_path.display());

    let db = shelfmark::db::Database::open(&db_path).context("Failed to open database")?;
    let catalog = shelfmark::catalog::Catalog::open(db, config.seed_example)
        .context("Failed to load catalog")?;
    let mut session = Session::new(catalog);

    match cli.command {
        Commands::Browse { query, media_type } => {
            let filter = session.nav.filter_mut(FilterContext::Catalog);
            filter.query = query.unwrap_or_default();
            filter.media_type = media_type.unwrap_or_default();

            let items = session.visible_catalog();
            if items.is_empty() {
                println!("No items found.");
                return Ok(());
            }
            print_item_table(&items);
            println!();
            println!("{} of {} items", items.len(), session.catalog.items().len());
        }

        Commands::Show { id } => {
            if session.navigate(Location::Item(id)) != &Location::Item(id) {
                println!("No item with id {id}.");
                return Ok(());
            }
            let item = session.catalog.require_item(id)?;
            print_item(item);

            let lists: Vec<&str> = session
                .catalog
                .lists()
                .iter()
                .filter(|l| l.contains(id))
                .map(|l| l.name.as_str())
                .collect();
            if !lists.is_empty() {
                println!();
                println!("In lists: {}", lists.join(", "));
            }
        }

        Commands::Add { fields } => {
            session.navigate(Location::New);
            let mut draft = Item::default();
            fields.apply(&mut draft)?;
            let id = session.save_item(draft).context("Failed to save item")?;
            println!("Added item {id}.");
        }

        Commands::Edit { id, fields } => {
            if session.navigate(Location::Edit(id)) != &Location::Edit(id) {
                println!("No item with id {id}.");
                return Ok(());
            }
            let mut draft = session.catalog.require_item(id)?.clone();
            fields.apply(&mut draft)?;
            session.save_item(draft).context("Failed to save item")?;
            println!("Saved item {id}.");
        }

        Commands::Delete { id, yes } => {
            if session.navigate(Location::Item(id)) != &Location::Item(id) {
                println!("No item with id {id}.");
                return Ok(());
            }
            let mut prompt = prompt_for(yes);
            if session.delete_current_item(&mut *prompt).context("Delete failed")? {
                println!("Deleted item {id}.");
            } else {
                println!("Cancelled.");
            }
        }

        Commands::Select { all, range, ids, yes } => {
            let selected = if all {
                session.select_all();
                Ok(())
            } else if let Some(range) = range {
                session.select_range(range[0], range[1])
            } else {
                session.select_items(&ids)
            };
            match selected {
                Err(CatalogError::NotFound { id, .. }) => {
                    println!("No item with id {id}.");
                    return Ok(());
                }
                other => other?,
            }

            if session.handle_gesture(Gesture::DeleteKey) != Outcome::DeleteRequested {
                println!("Nothing selected.");
                return Ok(());
            }
            let mut prompt = prompt_for(yes);
            let removed = session
                .delete_selected(&mut *prompt)
                .context("Delete failed")?;
            println!("Deleted {removed} items.");
        }

        Commands::Lists => {
            let lists = session.catalog.lists();
            if lists.is_empty() {
                println!("No lists yet.");
                return Ok(());
            }
            println!("{:>5}  {:<40} {:>6}", "Id", "Name", "Items");
            println!("{}", "-".repeat(53));
            for list in lists {
                println!(
                    "{:>5}  {:<40} {:>6}",
                    list.id.unwrap_or_default(),
                    truncate(&list.name, 40),
                    session.catalog.members(list).len()
                );
            }
        }

        Commands::List { action } => run_list_command(&mut session, action)?,

        Commands::Stats { media_type: Some(media_type) } => {
            session.navigate(Location::StatsType(media_type.clone()));
            let items = session.visible_catalog();
            if items.is_empty() {
                println!("No items of type \"{media_type}\".");
                return Ok(());
            }
            println!("{media_type} ({} items):", items.len());
            println!();
            print_item_table(&items);
        }

        Commands::Stats { media_type: None } => {
            let stats = shelfmark::stats::summarize(&session.catalog);
            println!("Catalog Statistics");
            println!("==================");
            println!("Total items:    {}", stats.total_items);
            println!("Lists:          {}", stats.total_lists);
            println!("Unknown type:   {}", stats.unknown_items);
            println!();

            if !stats.types.is_empty() {
                println!("Types:");
                for group in &stats.types {
                    println!("  {:<20} {}", group.label, group.count);
                }
            }
        }

        Commands::Import { file, no_posters } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let client = if no_posters {
                None
            } else {
                TmdbClient::from_config(&config.posters)
            };
            let posters: &dyn PosterLookup = match &client {
                Some(c) => c,
                None => &NoPosters,
            };
            let rate_limit = if client.is_some() {
                Duration::from_millis(config.posters.rate_limit_ms)
            } else {
                Duration::ZERO
            };

            let result =
                shelfmark::import::import_table(&mut session.catalog, &raw, posters, rate_limit)
                    .context("Import failed")?;
            println!(
                "Import complete: {} imported, {} skipped, {} posters found",
                result.imported, result.skipped, result.posters_found
            );
        }

        Commands::Types => {
            let types = shelfmark::filter::type_suggestions(session.catalog.items());
            if types.is_empty() {
                println!("No item types set.");
            }
            for t in types {
                println!("{t}");
            }
        }
    }

    Ok(())
}

fn run_list_command(session: &mut Session, action: ListCommand) -> Result<()> {
    match action {
        ListCommand::Show { id, query, media_type } => {
            if session.navigate(Location::List(id)) != &Location::List(id) {
                println!("No list with id {id}.");
                return Ok(());
            }
            let filter = session.nav.filter_mut(FilterContext::ListPicker);
            filter.query = query.unwrap_or_default();
            filter.media_type = media_type.unwrap_or_default();

            let list = session.catalog.require_list(id)?;
            let members = session.catalog.members(list);
            println!("{} ({} items)", list.name, members.len());
            println!();
            if members.is_empty() {
                println!("This list is empty.");
            } else {
                print_item_table(&members);
            }

            let candidates = session.add_picker();
            println!();
            println!("Available to add ({}):", candidates.len());
            if !candidates.is_empty() {
                print_item_table(&candidates);
            }
        }

        ListCommand::Create { name } => {
            let Some(name) = list_name(name) else {
                println!("Cancelled.");
                return Ok(());
            };
            let id = session.catalog.create_list(&name)?;
            println!("Created list {id} \"{}\".", name.trim());
        }

        ListCommand::Rename { id, name } => {
            session.catalog.rename_list(id, &name)?;
            println!("Renamed list {id}.");
        }

        ListCommand::Delete { id, yes } => {
            if session.navigate(Location::List(id)) != &Location::List(id) {
                println!("No list with id {id}.");
                return Ok(());
            }
            let mut prompt = prompt_for(yes);
            if session.delete_current_list(&mut *prompt)? {
                println!("Deleted list {id}.");
            } else {
                println!("Cancelled.");
            }
        }

        ListCommand::Add { item, to: Some(list), .. } => {
            match session.catalog.add_item_to_list(list, item)? {
                shelfmark::lists::AddOutcome::Added => println!("Added item {item} to list {list}."),
                shelfmark::lists::AddOutcome::AlreadyPresent => {
                    println!("Item {item} is already in list {list}.")
                }
            }
        }

        ListCommand::Add { item, to: None, new } => {
            let Some(name) = list_name(new) else {
                println!("Cancelled.");
                return Ok(());
            };
            let id = session.catalog.create_list_with_item(&name, item)?;
            println!("Created list {id} \"{}\" with item {item}.", name.trim());
        }

        ListCommand::Remove { list, item } => {
            if session.catalog.remove_item_from_list(list, item)? {
                println!("Removed item {item} from list {list}.");
            } else {
                println!("Item {item} was not in list {list}.");
            }
        }
    }
    Ok(())
}

/// Shorten to `max` characters, ending in "..." when cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        s.to_string()
    }
}

/// Print a table of items.
fn print_item_table(items: &[&Item]) {
    println!(
        "{:>5}  {:<35} {:>4}  {:<10} {:<10} {:>5}",
        "Id", "Title", "Year", "Type", "Format", "Discs"
    );
    println!("{}", "-".repeat(76));

    for item in items {
        println!(
            "{:>5}  {:<35} {:>4}  {:<10} {:<10} {:>5}",
            item.id.unwrap_or_default(),
            truncate(item.display_title(), 35),
            item.year.map(|y| y.to_string()).unwrap_or_default(),
            truncate(&item.media_type, 10),
            truncate(&item.format, 10),
            item.discs.map(|d| d.to_string()).unwrap_or_default(),
        );
    }
}

/// Print every non-blank field of an item, custom fields last.
fn print_item(item: &Item) {
    let year = item.year.map(|y| y.to_string()).unwrap_or_default();
    let discs = item.discs.map(|d| d.to_string()).unwrap_or_default();

    println!("{}", item.display_title());
    println!("{}", "=".repeat(item.display_title().chars().count()));
    for (label, value) in [
        ("Year", year.as_str()),
        ("Type", item.media_type.as_str()),
        ("Format", item.format.as_str()),
        ("Genre", item.genre.as_str()),
        ("Region", item.region.as_str()),
        ("Runtime", item.runtime.as_str()),
        ("Audio", item.audio.as_str()),
        ("HDR", item.hdr.as_str()),
        ("Languages", item.languages.as_str()),
        ("Subtitles", item.subtitles.as_str()),
        ("Edition", item.edition.as_str()),
        ("Discs", discs.as_str()),
        ("Barcode", item.barcode.as_str()),
        ("Packaging", item.packaging.as_str()),
        ("Poster", item.poster.as_str()),
        ("Notes", item.notes.as_str()),
    ] {
        if !value.is_empty() {
            println!("{label:<16} {value}");
        }
    }

    if !item.custom.is_empty() {
        println!();
        for (key, value) in &item.custom {
            println!("{:<16} {value}", shelfmark::labels::humanize(key));
        }
    }
}
