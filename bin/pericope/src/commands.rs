//! Subcommand implementations.
//!
//! Each command starts a session, wires the collaborators it needs into a
//! dispatcher, issues its requests before the companion is ready, and runs
//! the link until it goes quiet.

use std::{fs::File, sync::Arc};

use eyre::{Result, WrapErr};
use parking_lot::Mutex;
use pericope_browser::{BookList, FavoritesChanged, FavoritesList, VerseRangeList, Viewer};
use pericope_companion::{Companion, FavoriteStore, StaticVerseSource};
use pericope_delivery::Outbox;
use pericope_wire::{Passage, Testament};
use tracing::info;

use crate::{
    cli::{Cli, Commands},
    config::AppConfig,
    link::Session,
};

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load_or_create(&cli.config)?;
    config.apply_args(&cli.link);

    match cli.command {
        Commands::Books { testament } => books(&config, testament).await,
        Commands::Ranges { book, chapter } => ranges(&config, book, chapter).await,
        Commands::Read {
            book,
            chapter,
            range,
        } => read(&config, Passage::new(book, chapter, range)).await,
        Commands::Favorites => favorites(&config, None).await,
        Commands::ToggleFavorite {
            book,
            chapter,
            range,
        } => favorites(&config, Some(Passage::new(book, chapter, range))).await,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn start(config: &AppConfig) -> Result<Session> {
    let source = match &config.companion.verses_path {
        Some(path) => {
            let file = File::open(path)
                .wrap_err_with(|| format!("failed to open verses: {}", path.display()))?;
            StaticVerseSource::from_json(file)?
        }
        None => StaticVerseSource::sample(),
    };
    let favorites = FavoriteStore::load(&config.companion.favorites_path)?;
    info!(chapters = source.len(), favorites = favorites.len(), "Starting companion");

    let companion =
        Companion::new(source, favorites).with_favorites_path(&config.companion.favorites_path);
    Ok(Session::start(config, companion))
}

async fn books(config: &AppConfig, testament: Testament) -> Result<()> {
    let mut session = start(config)?;
    let list = Arc::new(Mutex::new(BookList::new(session.outbox(), testament)));
    let mut dispatcher = session.dispatcher().with_books_handler(Arc::clone(&list));

    list.lock().refresh();
    session.run_until_idle(&mut dispatcher).await?;
    list.lock().close();
    session.shutdown().await;

    let list = list.lock();
    println!("{testament}");
    for (index, book) in list.books().enumerate() {
        println!("{:>3}. {} ({} chapters)", index + 1, book.name, book.chapters);
    }
    if list.is_loading() {
        println!("(no books received)");
    }
    Ok(())
}

async fn ranges(config: &AppConfig, book: String, chapter: u8) -> Result<()> {
    let mut session = start(config)?;
    let list = Arc::new(Mutex::new(VerseRangeList::new(session.outbox(), book, chapter)));
    let mut dispatcher = session.dispatcher().with_verses_handler(Arc::clone(&list));

    list.lock().refresh();
    session.run_until_idle(&mut dispatcher).await?;
    list.lock().close();
    session.shutdown().await;

    let list = list.lock();
    println!("{} {}", list.book(), list.chapter());
    for range in list.ranges() {
        println!("  {range}");
    }
    if list.is_loading() {
        println!("(no verse ranges received)");
    }
    Ok(())
}

async fn read(config: &AppConfig, passage: Passage) -> Result<()> {
    let mut session = start(config)?;
    let viewer = Arc::new(Mutex::new(Viewer::new(session.outbox(), passage)));
    let mut dispatcher = session.dispatcher().with_viewer_handler(Arc::clone(&viewer));

    viewer.lock().load();
    session.run_until_idle(&mut dispatcher).await?;
    viewer.lock().close();
    session.shutdown().await;

    let viewer = viewer.lock();
    println!("{}", viewer.passage());
    println!("{}", viewer.text());
    Ok(())
}

/// List the favorites, toggling `toggle` first if given.
async fn favorites(config: &AppConfig, toggle: Option<Passage>) -> Result<()> {
    let mut session = start(config)?;
    let outbox = session.outbox();
    let list = Arc::new(Mutex::new(FavoritesList::new(Arc::clone(&outbox))));
    let mut dispatcher = session
        .dispatcher()
        .with_favorites_handler(Arc::clone(&list))
        .with_favorites_changed_handler(FavoritesChanged::new(Arc::clone(&list)));

    if let Some(passage) = &toggle {
        outbox.toggle_favorite(&passage.book, passage.chapter, &passage.range);
    }
    list.lock().refresh();
    session.run_until_idle(&mut dispatcher).await?;

    // The toggle may land after the list was sent. Refetch if so.
    if list.lock().refresh().is_some() {
        session.run_until_idle(&mut dispatcher).await?;
    }
    list.lock().close();
    session.shutdown().await;

    let list = list.lock();
    println!("Favorites");
    for favorite in list.favorites() {
        println!("  {favorite}");
    }
    if list.is_empty() {
        println!("  (none)");
    }
    Ok(())
}
