use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use postfeed::app::App;
use postfeed::composer::PostComposer;
use postfeed::config::Config;
use postfeed::feeds::{FeedLoader, Post};
use postfeed::gateway::{Gateway, MemoryGateway, RestGateway};
use postfeed::logging::{self, LogTarget};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "postfeed", version, about = "A terminal client for a hosted social feed")]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the feed (default)
    Run,
    /// Open the feed over built-in sample posts, without a backend
    Demo,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Publish a post without opening the interface
    Post {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Path of the image to attach
        #[arg(long)]
        image: String,
    },
    /// Print feed pages to stdout
    Feed {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
}

fn init_logging(cli: &Cli, interactive: bool) -> Result<()> {
    if cli.log_stderr || !interactive {
        return logging::init(&LogTarget::Stderr);
    }
    match logging::default_log_path() {
        Some(path) => logging::init(&LogTarget::File(path)),
        None => Ok(()),
    }
}

fn print_post(post: &Post) {
    println!(
        "#{} {}  [{}]",
        post.id,
        post.title,
        post.created_at.format("%Y-%m-%d %H:%M")
    );
    for line in textwrap::wrap(&post.content, 76) {
        println!("  {}", line);
    }
    if let Some(image) = &post.image_url {
        println!("  image: {}", image);
    }
    if !post.hashtags.is_empty() {
        println!("  {}", post.hashtags.join(" "));
    }
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Run) | Some(Commands::Demo));
    init_logging(&cli, interactive)?;

    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Init { force } => {
            let path = cli
                .config
                .clone()
                .or_else(Config::default_path)
                .context("Could not determine a config directory")?;
            Config::write_default(&path, *force)?;
            println!("Wrote {}", path.display());
        }
        Commands::Run => {
            let config = Config::load(cli.config.as_deref())?;
            let gateway: Arc<dyn Gateway> = Arc::new(RestGateway::new(&config.gateway));
            App::new(&config, gateway).run().await?;
        }
        Commands::Demo => {
            let config = Config::load(cli.config.as_deref())?;
            let gateway: Arc<dyn Gateway> = Arc::new(MemoryGateway::seeded());
            App::new(&config, gateway).run().await?;
        }
        Commands::Post {
            title,
            content,
            image,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let gateway = RestGateway::new(&config.gateway);

            let mut composer = PostComposer::new();
            composer.set_title(title.as_str());
            composer.set_content(content.as_str());
            composer.pick_image(image)?;
            composer.submit(&gateway).await?;

            println!("Post created");
            if !composer.hashtags().is_empty() {
                println!("hashtags: {}", composer.hashtags().join(" "));
            }
        }
        Commands::Feed { pages } => {
            let config = Config::load(cli.config.as_deref())?;
            let gateway = RestGateway::new(&config.gateway);
            let mut loader = FeedLoader::new(config.feed.page_size);

            for _ in 0..*pages {
                let Some(page) = loader.load_next_page(&gateway).await? else {
                    break;
                };
                println!("-- page {} --", page.page);
                page.posts.iter().for_each(print_post);
                if !page.has_more {
                    println!("-- end of feed --");
                    break;
                }
            }
        }
    }

    Ok(())
}
