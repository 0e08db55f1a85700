//! bookfeed CLI
//!
//! Drives the client library against a running backend. The session is
//! kept in `{storage_dir}/credentials.json` between invocations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use bookfeed::{
    credentials::FileCredentials,
    error::Result,
    feed::PaginatedFeed,
    models::{Config, Review, WishlistItem},
    services::ApiClient,
};
use clap::{Parser, Subcommand};

/// bookfeed - book reviews from the terminal
#[derive(Parser, Debug)]
#[command(name = "bookfeed", version, about = "Book-review social client")]
struct Cli {
    /// Path to storage directory containing config and credentials
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in profile
    Whoami,

    /// Show the review feed
    Feed {
        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Show reviews written by one user
    Reviews {
        user: String,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Upload a profile image (JPEG, PNG, GIF or WebP, max 5MB)
    Avatar { image: PathBuf },

    /// Like a review
    Like { review: String },

    /// Remove a like
    Unlike { review: String },

    /// List comments on a review
    Comments { review: String },

    /// Comment on a review
    Comment { review: String, text: String },

    /// Delete one of your comments
    Uncomment { comment: String },

    /// List book clubs
    Clubs,

    /// Join a club
    Join { club: String },

    /// Leave a club
    Leave { club: String },

    /// Ask the AI assistant to find books
    Ask { query: String },

    /// Chat with the AI assistant
    Chat { message: String },

    /// Get AI recommendations from your reviews and wishlist
    Recommend,

    /// Search the book catalog
    Books {
        query: String,

        /// Number of pages to load
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Manage your wishlist
    Wishlist {
        #[command(subcommand)]
        action: Option<WishlistAction>,
    },

    /// Validate configuration
    Validate,

    /// Show storage and session info
    Info,
}

#[derive(Subcommand, Debug)]
enum WishlistAction {
    /// Show the wishlist
    List,
    /// Add a catalog book by id
    Add { book: String },
    /// Remove a book by id
    Remove { book: String },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(storage_dir: &Path) -> Result<Config> {
    let path = storage_dir.join("config.toml");
    if path.exists() {
        Config::load(&path)
    } else {
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.storage_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.user_message());
            return ExitCode::FAILURE;
        }
    };
    init_logging(cli.verbose, &config.logging.level);

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{:?}", e);
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let credentials = FileCredentials::new(cli.storage_dir.join(&config.paths.credentials_file));
    let client = ApiClient::new(&config.api, Arc::new(credentials.clone()))?
        .with_session_expired_hook(|| {
            log::warn!("Session expired. Run `bookfeed login` to sign in again.");
        });

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let session = client.auth().register(&username, &email, &password).await?;
            if let Some(user) = session.user {
                println!("Welcome, {}!", user.username);
            }
        }

        Command::Login { email, password } => {
            let session = client.auth().login(&email, &password).await?;
            if let Some(user) = session.user {
                println!("Signed in as {}", user.username);
            }
        }

        Command::Logout => {
            client.auth().logout().await?;
            println!("Signed out");
        }

        Command::Whoami => {
            let profile = client.users().profile().await?;
            println!("{} <{}>", profile.username, profile.email);
            if let Some(bio) = profile.bio.filter(|b| !b.is_empty()) {
                println!("{bio}");
            }
            if !profile.favorite_genres.is_empty() {
                println!("Favorite genres: {}", profile.favorite_genres.join(", "));
            }
        }

        Command::Feed { pages } => {
            let feed = client.review_feed(config.feed.page_size);
            load_pages(&feed, pages).await?;
            print_feed(&feed, client.current_user().await?.map(|u| u.id));
        }

        Command::Reviews { user, pages } => {
            let feed = client.user_review_feed(&user, config.feed.page_size);
            load_pages(&feed, pages).await?;
            print_feed(&feed, client.current_user().await?.map(|u| u.id));
        }

        Command::Avatar { image } => {
            let uploaded = client.users().upload_profile_image(&image).await?;
            println!("Profile image updated: {}", uploaded.image_url);
        }

        Command::Like { review } => {
            let status = client.reviews().like(&review).await?;
            println!("Liked ({} likes)", status.likes_count);
        }

        Command::Unlike { review } => {
            let status = client.reviews().unlike(&review).await?;
            println!("Unliked ({} likes)", status.likes_count);
        }

        Command::Comments { review } => {
            let comments = client.comments().list(&review).await?;
            if comments.is_empty() {
                println!("No comments yet");
            }
            for comment in comments {
                println!("[{}] {}: {}", comment.id, comment.user.username, comment.text);
            }
        }

        Command::Comment { review, text } => {
            let comment = client.comments().add(&review, &text).await?;
            println!("Comment posted ({})", comment.id);
        }

        Command::Uncomment { comment } => {
            client.comments().delete(&comment).await?;
            println!("Comment deleted");
        }

        Command::Clubs => {
            let feed = client.club_feed();
            feed.refresh().await?;
            let viewer = client.current_user().await?.map(|u| u.id);
            for club in feed.snapshot().items.iter() {
                let joined = viewer.as_deref().is_some_and(|v| club.has_member(v));
                println!(
                    "[{}] {} ({} members{}){}",
                    club.id,
                    club.name,
                    club.member_count(),
                    if joined { ", joined" } else { "" },
                    if club.category.is_empty() {
                        String::new()
                    } else {
                        format!(" - {}", club.category)
                    }
                );
            }
        }

        Command::Join { club } => {
            let club = client.clubs().join(&club).await?;
            println!("Joined {} ({} members)", club.name, club.member_count());
        }

        Command::Leave { club } => {
            let club = client.clubs().leave(&club).await?;
            println!("Left {} ({} members)", club.name, club.member_count());
        }

        Command::Ask { query } => {
            let books = client.ai().search(&query).await?;
            for book in books {
                println!("{} by {}", book.title, book.author);
                if !book.match_reason.is_empty() {
                    println!("    {}", book.match_reason);
                }
            }
        }

        Command::Chat { message } => {
            let reply = client.ai().chat(&message, &[]).await?;
            println!("{}", reply.reply);
        }

        Command::Recommend => {
            let books = client.ai().recommend().await?;
            for book in books {
                println!("{} by {} ({})", book.title, book.author, book.genre);
            }
        }

        Command::Books { query, pages } => {
            let feed = client.catalog_feed(&query, config.feed.page_size);
            load_pages(&feed, pages).await?;
            let snapshot = feed.snapshot();
            for book in snapshot.items.iter() {
                println!("[{}] {} by {}", book.id, book.display_title(), book.display_author());
            }
            println!("{} of {} results", snapshot.items.len(), snapshot.total_count);
        }

        Command::Wishlist { action } => {
            let items = match action.unwrap_or(WishlistAction::List) {
                WishlistAction::List => client.users().wishlist().await?,
                WishlistAction::Add { book } => {
                    let book = client.books().get(&book).await?;
                    client
                        .users()
                        .add_to_wishlist(&WishlistItem::from(&book))
                        .await?
                }
                WishlistAction::Remove { book } => {
                    client.users().remove_from_wishlist(&book).await?
                }
            };
            if items.is_empty() {
                println!("Wishlist is empty");
            }
            for item in items {
                println!("[{}] {} by {}", item.book_id, item.title, item.authors.join(", "));
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("Config OK");
        }

        Command::Info => {
            println!("Storage directory: {}", cli.storage_dir.display());
            println!("API: {}", client.base_url());
            println!("Credentials: {}", credentials.path().display());
            match client.current_user().await? {
                Some(user) => println!("Signed in as {} ({})", user.username, user.id),
                None => println!("Not signed in"),
            }
        }
    }

    Ok(())
}

/// Refresh, then append until `pages` are loaded or the feed runs out.
async fn load_pages<T: Clone + Send + Sync + 'static>(
    feed: &PaginatedFeed<T>,
    pages: u32,
) -> Result<()> {
    feed.refresh().await?;
    for _ in 1..pages {
        if !feed.gate().has_next_page {
            break;
        }
        feed.load_more().await?;
    }
    Ok(())
}

fn print_feed(feed: &PaginatedFeed<Review>, viewer: Option<String>) {
    let snapshot = feed.snapshot();
    for review in snapshot.items.iter() {
        let liked = viewer.as_deref().is_some_and(|v| review.is_liked_by(v));
        println!(
            "[{}] {} by {} - {}/5 by {}",
            review.id,
            review.book_title,
            review.book_author,
            review.rating,
            review
                .user
                .as_ref()
                .map(|u| u.username.as_str())
                .unwrap_or("unknown")
        );
        println!(
            "    {} likes{}, {} comments",
            review.likes_count,
            if liked { " (liked)" } else { "" },
            review.comments_count
        );
    }
    println!(
        "{} of {} reviews (page {}{})",
        snapshot.items.len(),
        snapshot.total_count,
        snapshot.current_page,
        if snapshot.has_next_page { ", more available" } else { "" }
    );
}
