mod console;
pub mod settings;
pub mod timer;
pub mod utils;
pub mod view;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use settings::SettingsStore;
use timer::{TimerController, TokioScheduler};

pub use utils::logging::init_logging;

/// Runs the console stopwatch until stdin closes or `q` is entered.
pub fn run(settings_path: Option<PathBuf>, log_level: log::LevelFilter) -> Result<()> {
    init_logging(log_level);

    log::info!("Stopwatch starting up...");

    let settings = SettingsStore::new(settings_path)?.stopwatch();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .build()?;

    runtime.block_on(async {
        let controller = TimerController::new(Arc::new(TokioScheduler::current()), &settings);
        let result = console::read_loop(&controller).await;
        controller.reset();
        result
    })
}
