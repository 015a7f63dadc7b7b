mod api;
mod app;
mod moderation;
mod refresh;
mod storage;
mod ui;
mod utils;

use anyhow::{Context, Result, bail};
use api::client::ApiClient;
use app::AppState;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use storage::LocalStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use ui::board::BoardView;
use ui::detail::DetailView;
use ui::render;
use ui::settings::SettingsView;

#[derive(Parser)]
#[command(name = "noticeboard")]
#[command(version, about = "Admin console for the notice board service")]
struct Cli {
    /// Backend address, overrides the saved setting
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Value sent as the x-api-key header, overrides the saved setting
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Skip confirmation prompts for destructive actions
    #[arg(long, global = true)]
    yes: bool,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Live board: refreshes every few seconds and reads commands from stdin
    Board,
    /// Print the board once
    List {
        /// Include notices from groups that are not official
        #[arg(long)]
        all: bool,
    },
    /// Show a single notice
    Show { id: i64 },
    /// Broadcast a notice
    Post {
        title: String,
        content: String,
        /// Target group; must be official
        #[arg(short, long)]
        group: Option<String>,
    },
    /// Post to all groups, attaching the official group list
    Create { title: String, content: String },
    /// Reply to a notice's group
    Reply { id: i64, message: String },
    Delete { id: i64 },
    /// Delete every notice on the backend
    ClearAll,
    /// Official, pending and blocked groups
    Groups,
    Approve { name: String },
    /// Hide a group on this device only
    Reject { name: String },
    /// Drop a group from the official list
    Remove {
        name: String,
        /// Also delete the group's notices
        #[arg(long)]
        purge: bool,
    },
    /// Check the backend and save connection settings
    Config,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let state = AppState::load().with_overrides(cli.base_url.as_deref(), cli.api_key.as_deref());
    let client = Arc::new(
        ApiClient::new(&state.base_url, state.api_key.as_deref())
            .with_context(|| format!("cannot use backend address {}", state.base_url))?,
    );

    run(cli.command, cli.yes, &state, client).await
}

fn open_store() -> Result<LocalStore> {
    LocalStore::open_default().context("cannot open local storage")
}

async fn run(command: Commands, yes: bool, state: &AppState, client: Arc<ApiClient>) -> Result<()> {
    match command {
        Commands::Board => {
            let board = BoardView::new(client.clone(), open_store()?)?;
            ui::console::run(board, client, state.poll_interval(), yes).await?;
        }
        Commands::List { all } => {
            let mut board = BoardView::new(client, open_store()?)?;
            board.refresh().await?;
            if all {
                println!("{}", render::notice_list(board.notices()));
            } else {
                println!("{}", render::board(&board));
            }
        }
        Commands::Show { id } => {
            let mut view = DetailView::new(id);
            let notice = view.load(&client).await?;
            println!("{}", render::detail(notice));
        }
        Commands::Post { title, content, group } => {
            let mut board = BoardView::new(client, open_store()?)?;
            board.refresh().await?;
            if let Some(group) = group {
                board.select_group(&group)?;
            }
            board.draft.title = title;
            board.draft.content = content;
            board.post().await?;
            println!("Broadcast to {}.", board.draft.group);
        }
        Commands::Create { title, content } => {
            ui::create::create_notice(&client, &title, &content).await?;
            println!("Notice sent to all groups.");
        }
        Commands::Reply { id, message } => {
            let mut board = BoardView::new(client, open_store()?)?;
            board.refresh().await?;
            board.open_reply(id)?;
            board.set_reply_text(&message)?;
            board.send_reply().await?;
            println!("Reply sent.");
        }
        Commands::Delete { id } => {
            if !utils::confirm("Delete this notice?", yes) {
                bail!("not confirmed; pass --yes to delete without a prompt");
            }
            let mut board = BoardView::new(client, open_store()?)?;
            board.delete(id).await?;
            println!("Deleted notice {id}.");
        }
        Commands::ClearAll => {
            let confirmed = utils::confirm(
                "ARE YOU SURE? This will permanently delete ALL notices from the database.",
                yes,
            ) && utils::confirm("Final warning: This cannot be undone. Clear everything?", yes);
            if !confirmed {
                bail!("not confirmed; pass --yes to clear without a prompt");
            }
            let mut board = BoardView::new(client, open_store()?)?;
            board.clear_all().await?;
            println!("All notices cleared successfully.");
        }
        Commands::Groups => {
            let mut view = SettingsView::new(client, open_store()?)?;
            view.load().await?;
            println!("{}", render::settings(&view));
        }
        Commands::Approve { name } => {
            let mut view = SettingsView::new(client, open_store()?)?;
            view.load().await?;
            view.approve(&name).await?;
            println!("{}", render::settings(&view));
        }
        Commands::Reject { name } => {
            let mut view = SettingsView::new(client, open_store()?)?;
            view.load().await?;
            view.reject(&name)?;
            println!("{}", render::settings(&view));
        }
        Commands::Remove { name, purge } => {
            let mut view = SettingsView::new(client, open_store()?)?;
            view.load().await?;
            view.remove(&name, purge).await?;
            println!("{}", render::settings(&view));
        }
        Commands::Config => {
            let status = client.ping().await?;
            if !(200..300).contains(&status) {
                bail!("backend at {} answered HTTP {status}", client.base_url());
            }
            let path = state.save()?;
            println!("Saved settings to {}.", path.display());
        }
    }
    Ok(())
}
