//! Gesture Control - hand-pose driven desktop input
//!
//! Runs the mode controller against a landmark stream, or replays a recorded
//! stream offline.

use gesture_control::app::cli::{Cli, Commands, ConfigAction};
use gesture_control::app::config::Config;
use gesture_control::app::session::StreamSessionFactory;
use gesture_control::gesture::replay::replay;
use gesture_control::gesture::rules::Profile;
use gesture_control::hand::source::{JsonLinesSource, LandmarkInput, RecordDetector};
use gesture_control::mode::{Mode, ModeController};
use gesture_control::output::action::Dispatcher;
use gesture_control::output::sink::RecordingSink;
use gesture_control::trigger::TriggerInputs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if cli.config.is_some() {
        Config::load(&config_path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Run {
            landmarks,
            dry_run,
            start_in,
            profile,
            no_pointer,
            remote,
        } => {
            let options = RunOptions {
                landmarks,
                dry_run,
                start_in,
                profile,
                no_pointer,
                remote,
            };
            run_controller(options, config)?;
        }
        Commands::Replay { input, profile, json } => {
            run_replay(&input, profile, json, config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config_path)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, &config_path)?;
        }
    }

    Ok(())
}

struct RunOptions {
    landmarks: String,
    dry_run: bool,
    start_in: Option<Mode>,
    profile: Option<Profile>,
    no_pointer: bool,
    remote: Option<String>,
}

fn run_controller(options: RunOptions, mut config: Config) -> anyhow::Result<()> {
    if let Some(profile) = options.profile {
        config.gesture.profile = profile;
    }
    if let Some(mode) = options.start_in {
        config.mode.start_mode = mode;
    }
    if let Some(address) = options.remote {
        config.remote.enabled = true;
        config.remote.address = address;
    }
    config.validate()?;

    let screen = rdev::display_size()
        .ok()
        .map(|(w, h)| (w as i32, h as i32));
    let factory = StreamSessionFactory::new(LandmarkInput::parse(&options.landmarks), options.dry_run)
        .with_dry_run_screen(screen);
    info!(
        "Profile {:?}, {} rules, landmarks from {:?}{}",
        config.gesture.profile,
        config.rules().len(),
        factory.input(),
        if options.dry_run { " (dry run)" } else { "" }
    );

    let mut triggers = TriggerInputs::new();
    if !options.no_pointer {
        triggers = triggers.spawn_pointer(config.capture.trigger_buffer_size)?;
        info!(
            "{}x {} click within {}ms toggles gesture mode",
            config.mode.click_count, config.mode.trigger_button, config.mode.click_threshold_ms
        );
    }
    if config.remote.enabled {
        triggers = triggers.spawn_remote(
            config.capture.trigger_buffer_size,
            config.remote.address.clone(),
            config.remote.retry_delay(),
        )?;
    }
    if triggers.pointer.is_none() && triggers.remote.is_none() && config.mode.start_mode == Mode::Mouse {
        warn!("No trigger enabled and starting in mouse mode; nothing will happen until Ctrl+C");
    }

    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_handler = stop_flag.clone();
    ctrlc::set_handler(move || {
        stop_flag_handler.store(true, Ordering::SeqCst);
    })?;

    let mut controller = ModeController::new(Arc::new(factory), config.session_config(), &config.mode);
    if config.mode.start_mode == Mode::Gesture {
        controller.set_mode(Mode::Gesture);
    }

    info!("Running... Press Ctrl+C to stop");
    if let Err(e) = controller.run(&mut triggers, &stop_flag) {
        error!("{}", e);
        return Err(e.into());
    }
    info!("Stopped after {} mode transitions", controller.transitions());
    Ok(())
}

fn run_replay(input: &str, profile: Option<Profile>, json: bool, mut config: Config) -> anyhow::Result<()> {
    if let Some(profile) = profile {
        config.gesture.profile = profile;
        config.validate()?;
    }

    let input = LandmarkInput::parse(input);
    let mut source = JsonLinesSource::open_input(&input)?;
    let mut detector = RecordDetector::new();
    let session = config.session_config();
    let mut machine = session.build_machine(None);
    let dispatcher = Dispatcher::new(session.dispatch.clone());
    let mut sink = RecordingSink::new();

    let report = replay(&mut source, &mut detector, &mut machine, &dispatcher, &mut sink)?;

    for event in &report.events {
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{:>8}ms  frame {:<6} {}  {}", event.t_ms, event.frame, event.fingers, event.action);
        }
    }
    if !json {
        println!(
            "\n{} frames ({} with a hand, {} skipped), {} actions, {} sink calls",
            report.frames,
            report.hands,
            report.skipped,
            report.events.len(),
            sink.len()
        );
    }
    Ok(())
}

fn run_init(force: bool, config_path: &PathBuf) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    let config = Config::default();
    config.save(config_path)?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);
    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, config_path: &PathBuf) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            println!("{} = {}", key, config.get_value(&key)?);
        }
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'gesture-ctl init' first.");
            }
            let updated = config.with_value(&key, &value)?;
            updated.save(config_path)?;
            println!("Set {} = {}", key, updated.get_value(&key)?);
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }
            Config::default().save(config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
