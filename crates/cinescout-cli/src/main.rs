use anyhow::Context;
use cinescout_cache::SqliteStore;
use cinescout_core::{
    providers::TmdbProvider, Catalog, Config, FavoriteId, FavoriteItem, FavoritesStore, Movie,
    SearchDebouncer, SearchState, ThemeStore,
};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cinescout")]
#[command(version, about = "Terminal movie discovery with local favorites", long_about = None)]
struct Cli {
    /// Print movie lists as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Movies trending this week
    Trending,
    /// Popular TV right now
    Popular,
    /// Search movies. Without a query, reads one query per line from stdin
    Search {
        /// Search query
        query: Option<String>,
    },
    /// List or toggle favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Show the resolved theme and its palette
    Theme {
        /// Flip light/dark before showing it
        #[arg(long)]
        toggle: bool,
    },
}

#[derive(clap::Subcommand)]
enum FavoritesAction {
    /// Show everything favorited, oldest first
    List,
    /// Add the title if it isn't a favorite yet, remove it if it is
    Toggle {
        /// TMDB id (or any string id)
        id: String,
        /// Title to store when the id can't be found in trending/popular
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinescout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load config")?;

    match cli.command {
        Some(Commands::Trending) => {
            let favorites = open_favorites(&config).await?;
            let movies = build_catalog(&config)?.trending().await;
            print_movies(&movies, &favorites, cli.json)?;
        }
        Some(Commands::Popular) => {
            let favorites = open_favorites(&config).await?;
            let movies = build_catalog(&config)?.popular().await;
            print_movies(&movies, &favorites, cli.json)?;
        }
        Some(Commands::Search { query: Some(query) }) => {
            tracing::info!("Searching for: {}", query);
            let favorites = open_favorites(&config).await?;
            let movies = build_catalog(&config)?.search(&query).await;
            print_movies(&movies, &favorites, cli.json)?;
        }
        Some(Commands::Search { query: None }) => {
            let favorites = Arc::new(open_favorites(&config).await?);
            let catalog = Arc::new(build_catalog(&config)?);
            interactive_search(&config, catalog, favorites, cli.json).await?;
        }
        Some(Commands::Favorites { action }) => {
            let favorites = open_favorites(&config).await?;
            match action {
                FavoritesAction::List => print_favorites(&favorites.get_all(), cli.json)?,
                FavoritesAction::Toggle { id, title } => {
                    toggle(&config, &favorites, &id, title).await?;
                }
            }
        }
        Some(Commands::Theme { toggle }) => {
            let theme = ThemeStore::detect(config.ui.theme.as_deref());
            if toggle {
                theme.toggle_theme();
            }

            let current = theme.current();
            let palette = current.palette();
            println!("Theme: {}", current);
            println!("  background  {}", palette.background.hex());
            println!("  surface     {}", palette.surface.hex());
            println!("  foreground  {}", palette.foreground.hex());
            println!("  muted       {}", palette.muted.hex());
            println!("  border      {}", palette.border.hex());
            println!("  favorite    {}", palette.favorite.hex());
        }
        None => {
            println!("No command specified. Try --help");
        }
    }

    Ok(())
}

fn build_catalog(config: &Config) -> anyhow::Result<Catalog> {
    if config.tmdb_token().is_none() {
        tracing::warn!("No TMDB token configured; set TMDB_TOKEN or tmdb.token in the config");
    }

    let provider = TmdbProvider::from_config(config).context("Failed to build TMDB client")?;
    Ok(Catalog::new(Arc::new(provider)))
}

async fn open_favorites(config: &Config) -> anyhow::Result<FavoritesStore> {
    let path = match &config.storage.path {
        Some(path) => path.clone(),
        None => SqliteStore::default_path()?,
    };

    let storage = SqliteStore::open(&path)
        .with_context(|| format!("Failed to open favorites database at {:?}", path))?;

    Ok(FavoritesStore::open(Arc::new(storage)).await)
}

async fn toggle(
    config: &Config,
    favorites: &FavoritesStore,
    raw_id: &str,
    title: Option<String>,
) -> anyhow::Result<()> {
    let id: FavoriteId = raw_id.parse()?;

    let mut found = None;
    let item = if favorites.is_favorite(&id) {
        // Removal only needs the id
        FavoriteItem::new(id.clone())
    } else {
        found = lookup_in_feed(config, &id).await?;
        match &found {
            Some(movie) => movie.to_favorite()?,
            None => {
                let mut item = FavoriteItem::new(id.clone());
                if let Some(title) = title {
                    item = item.with_field("title", title);
                }
                item
            }
        }
    };

    favorites.toggle_favorite(item).await?;

    if !favorites.is_favorite(&id) {
        println!("  Removed {} from favorites", id);
        return Ok(());
    }

    match found {
        Some(movie) => {
            println!("♥ Added {} ({}) to favorites", movie.title, id);
            if let Some(url) = movie.hero_image_url(&config.tmdb.image_base_url) {
                println!("  {}", url);
            }
        }
        None => println!("♥ Added {} to favorites", id),
    }
    Ok(())
}

/// Find full details for an id in the home feed, so the favorite has a title and poster
async fn lookup_in_feed(config: &Config, id: &FavoriteId) -> anyhow::Result<Option<Movie>> {
    let FavoriteId::Int(wanted) = id else {
        return Ok(None);
    };
    if config.tmdb_token().is_none() {
        return Ok(None);
    }

    let feed = build_catalog(config)?.home_feed().await;
    Ok(feed
        .trending
        .into_iter()
        .chain(feed.popular)
        .find(|m| m.favorite_id() == Some(FavoriteId::Int(*wanted))))
}

async fn interactive_search(
    config: &Config,
    catalog: Arc<Catalog>,
    favorites: Arc<FavoritesStore>,
    json: bool,
) -> anyhow::Result<()> {
    let debouncer = SearchDebouncer::new(
        catalog,
        Duration::from_millis(config.ui.search_debounce_ms),
    );

    let mut updates = debouncer.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state: SearchState = updates.borrow_and_update().clone();
            if state.is_searching {
                eprintln!("Searching for {:?}...", state.query);
            } else if !state.query.is_empty() {
                if let Err(e) = print_movies(&state.results, &favorites, json) {
                    tracing::warn!("Failed to print results: {}", e);
                }
            }
        }
    });

    let mut settled = debouncer.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = String::new();

    while let Some(line) = lines.next_line().await? {
        last = line.clone();
        debouncer.submit(line);
    }

    if !last.trim().is_empty() {
        // Stdin closed; let the final query finish before we exit
        let wait = settled.wait_for(|s| s.query == last && !s.is_searching);
        if tokio::time::timeout(Duration::from_secs(30), wait).await.is_err() {
            tracing::warn!("Gave up waiting for search results");
        }
    }

    // Dropping the debouncer closes the channel once in-flight tasks finish
    drop(debouncer);
    drop(settled);
    printer.await?;
    Ok(())
}

fn print_movies(movies: &[Movie], favorites: &FavoritesStore, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(movies)?);
        return Ok(());
    }

    if movies.is_empty() {
        println!("Nothing found.");
        return Ok(());
    }

    for movie in movies {
        let is_favorite = movie
            .favorite_id()
            .is_some_and(|id| favorites.is_favorite(&id));
        let heart = if is_favorite {
            "♥"
        } else {
            " "
        };
        let year = movie
            .release_year()
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        let rating = movie
            .rating_label()
            .map(|r| format!("  ★ {}", r))
            .unwrap_or_default();
        let genres = movie.genre_names();
        let genres = if genres.is_empty() {
            String::new()
        } else {
            format!("  [{}]", genres)
        };

        println!("{} {:>8}  {}{}{}{}", heart, movie.id, movie.title, year, rating, genres);
    }

    Ok(())
}

fn print_favorites(items: &[FavoriteItem], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }

    for item in items {
        println!("♥ {:>10}  {}", item.id.to_string(), item.title().unwrap_or("(untitled)"));
    }

    Ok(())
}
