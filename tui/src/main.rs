use anyhow::Context;
use clap::Parser;
use platform::{
    api::HttpLiveApi,
    catalog::CategoryCatalog,
    session::SessionManager,
    store::{Preferences, Store},
};
use tracing::{info, warn};

use config::Args;
use state_store::{StateStore, Studio};
use termination::{create_termination, Interrupted};
use ui_management::UiManager;

mod config;
mod logging;
mod state_store;
mod termination;
mod ui_management;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let data_dir = args.data_dir();

    logging::init_logging(&args.log_file())?;
    let store = Store::open(&data_dir)
        .with_context(|| format!("could not open data directory {}", data_dir.display()))?;
    info!(data_dir = %data_dir.display(), "starting");

    let preferences = store.load_preferences().unwrap_or_else(|err| {
        warn!(error = %err, "using default preferences");
        Preferences::default()
    });
    let catalog = CategoryCatalog::load(&store).unwrap_or_else(|err| {
        warn!(error = %err, "category cache is unreadable, starting with an empty list");
        CategoryCatalog::default()
    });

    let api = HttpLiveApi::new(args.client_config()).context("could not build the HTTP client")?;
    let mut manager = SessionManager::new(api, store);
    manager.set_auto_save(preferences.auto_save_cookies);
    let studio = Studio::new(manager, catalog, preferences, args.poll_interval());

    let (terminator, mut interrupt_rx) = create_termination();
    let (state_store, state_rx) = StateStore::new();
    let (ui_manager, action_rx) = UiManager::new();

    tokio::try_join!(
        state_store.main_loop(studio, terminator, action_rx, interrupt_rx.resubscribe()),
        ui_manager.main_loop(state_rx, interrupt_rx.resubscribe()),
    )?;

    if let Ok(reason) = interrupt_rx.recv().await {
        match reason {
            Interrupted::UserInt => println!("exited per user request"),
            Interrupted::OsSigInt => println!("exited because of an os sig int"),
        }
    } else {
        println!("exited because of an unexpected error");
    }

    Ok(())
}
