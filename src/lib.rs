pub mod abstraction;
pub mod bucket;
pub mod cards;
pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod driver;
pub mod error;
pub mod game;
pub mod infoset;
pub mod parallel;
pub mod resolver;
pub mod rules;
pub mod sampler;
pub mod store;

/// dimensional analysis types
pub type Chips = i32;
pub type Probability = f64;
pub type Utility = f64;

pub const N_PLAYERS: usize = 2;
pub const DEFAULT_STACK: Chips = 20_000;
pub const DEFAULT_BIG_BLIND: Chips = 100;
pub const DEFAULT_SMALL_BLIND: Chips = 50;
pub const MIN_CHIP_INCREMENT: Chips = 1;
pub const MAX_RAISE_REPEATS: usize = 6;
pub const ALL_IN_THRESHOLD: f64 = 0.97;

pub const REGRET_MIN: Utility = -3e8;
pub const REGRET_MAX: Utility = Utility::MAX / 4.0;
pub const POLICY_MIN: Probability = Probability::MIN_POSITIVE;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// install the combined terminal + rolling file logger used by every binary.
pub fn init_logging(verbosity: log::LevelFilter) {
    let _ = std::fs::create_dir_all("logs");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves forward")
        .as_secs();
    let term = simplelog::TermLogger::new(
        verbosity,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    let loggers: Vec<Box<dyn simplelog::SharedLogger>> =
        match std::fs::File::create(format!("logs/{}.log", time)) {
            Ok(file) => vec![
                term,
                simplelog::WriteLogger::new(log::LevelFilter::Debug, config, file),
            ],
            Err(_) => vec![term],
        };
    let _ = simplelog::CombinedLogger::init(loggers);
}

/// resolves the path to another binary built alongside the current one —
/// this crate ships separate `trainer`/`worker`/`resolve`/`coordinate`
/// binaries rather than one dispatching on a subcommand, so a parallel
/// batch or a chunked run locates its sibling this way instead of
/// re-exec'ing `current_exe()` with an extra argument.
pub fn sibling_binary(name: &str) -> std::io::Result<std::path::PathBuf> {
    let current = std::env::current_exe()?;
    let file_name = if cfg!(windows) { format!("{name}.exe") } else { name.to_string() };
    Ok(current.with_file_name(file_name))
}

/// install a Ctrl-C handler that requests graceful shutdown via the returned flag
/// rather than exiting from within the signal handler itself.
pub fn install_shutdown_flag() -> std::sync::Arc<std::sync::atomic::AtomicBool> {
    let flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    let handle = flag.clone();
    let _ = ctrlc::set_handler(move || {
        log::warn!("interrupt received, requesting graceful stop");
        handle.store(true, std::sync::atomic::Ordering::SeqCst);
    });
    flag
}
