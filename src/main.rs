use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use camera_ctl::session::{DEFAULT_CONFIG_FILE, DEFAULT_DEVICE};
use camera_ctl::{FpsCeiling, PresetOrder, Session, SessionConfig, V4l2Device, ui};

const EXAMPLES: &str = "\
EXAMPLES:
    camera-ctl
    camera-ctl -v /dev/video2 -c ~/camera.txt
    camera-ctl -p /etc/camera-presets -a
    camera-ctl -d -f 60 -i focus -i zoom
    camera-ctl -l";

#[derive(Parser, Debug)]
#[command(name = "camera-ctl")]
#[command(about = "Adjust, save and restore V4L2 camera controls from a terminal")]
#[command(version)]
#[command(after_help = EXAMPLES)]
struct Cli {
    /// Load preset files in alphabetical order
    #[arg(short = 'a', long = "alphabetical")]
    alphabetical: bool,

    /// Config file used by load and save
    #[arg(short = 'c', long = "config", value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Hide codec controls that do not apply to the current pixel format
    #[arg(short = 'd', long = "strict")]
    strict: bool,

    /// Highest selectable frame rate (1-120)
    #[arg(short = 'f', long = "fps-max", value_name = "FPS", default_value = "30")]
    fps_max: FpsCeiling,

    /// Leave out controls whose variable name starts with NAME (repeatable)
    #[arg(short = 'i', long = "ignore", value_name = "NAME")]
    ignore: Vec<String>,

    /// Print the available controls and exit
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Directory with preset files
    #[arg(short = 'p', long = "presets", value_name = "DIR")]
    presets: Option<PathBuf>,

    /// V4L2 device node
    #[arg(short = 'v', long = "device", value_name = "DEVICE", default_value = DEFAULT_DEVICE)]
    device: PathBuf,
}

impl From<Cli> for SessionConfig {
    fn from(cli: Cli) -> Self {
        Self {
            device: cli.device,
            config_file: cli.config,
            preset_dir: cli.presets,
            preset_order: if cli.alphabetical { PresetOrder::Alphabetical } else { PresetOrder::Numeric },
            strict: cli.strict,
            fps_ceiling: cli.fps_max,
            ignore: cli.ignore,
            list_only: cli.list,
        }
    }
}

fn main() -> ExitCode {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=camera_ctl=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    match run(SessionConfig::from(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.list_only {
        return list_controls(&config);
    }

    let mut session = Session::open(config)?;
    ui::run(&mut session)?;
    Ok(())
}

fn list_controls(config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut device = V4l2Device::open(&config.device)?;
    println!("{} ({}, {})", device.path().display(), device.card(), device.driver());
    for control in config.registry_builder().list(&mut device)? {
        println!("{:>30} = {}", control.variable_name, control.display_name);
    }
    Ok(())
}
