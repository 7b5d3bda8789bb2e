mod cli;

use clap::Parser;

fn main() {
    let arguments = cli::Arguments::parse();
    let log_level = arguments.log_level();

    if let Err(e) = stopwatch_lib::run(arguments.settings, log_level) {
        log::error!("Unable to run the stopwatch: {e:#}");
        std::process::exit(1);
    }
}
