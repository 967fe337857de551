//! MateBot daemon entry point.
//!
//! Loads the TOML configuration, starts the motion and SLAM loops, and runs
//! until SIGINT/SIGTERM.

use std::path::PathBuf;
use std::sync::atomic::Ordering;

use clap::Parser;
use log::{error, info};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use matebot::App;
use matebot_core::config::BotConfig;

/// Default configuration file probed when none is given.
const DEFAULT_CONFIG: &str = "matebot.toml";

#[derive(Parser, Debug)]
#[command(name = "matebot", version, about = "MateBot mecanum robot daemon")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Force all hardware backends to simulation
    #[arg(long)]
    sim: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("MateBot v{} starting...", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            info!("Using config: {}", path.display());
            match BotConfig::load(path) {
                Ok(config) => config,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        None if std::path::Path::new(DEFAULT_CONFIG).exists() => {
            info!("Using config: {}", DEFAULT_CONFIG);
            match BotConfig::load(DEFAULT_CONFIG) {
                Ok(config) => config,
                Err(e) => {
                    error!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        None => {
            info!("No config file found, using defaults");
            BotConfig::default()
        }
    };

    if args.sim {
        info!("Simulation mode forced from the command line");
        config.force_simulation();
    }

    let mut app = App::start(&config);

    // SIGINT/SIGTERM clear the running flag; each loop notices within a tick
    let flag = app.running_flag();
    std::thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            let mut signals = Signals::new([SIGINT, SIGTERM])
                .expect("failed to register signal handlers");
            if let Some(signal) = signals.forever().next() {
                info!("Received signal {:?}, initiating shutdown...", signal);
                flag.store(false, Ordering::Relaxed);
            }
        })
        .expect("failed to spawn signal handler thread");

    info!("Press Ctrl-C to stop");
    app.run_until_shutdown();

    info!("Shutting down...");
    app.join();
}
