use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use paneldir::config::Settings;
use paneldir::services::remote::HttpDirectoryService;
use paneldir::ui::app::App;
use paneldir::ui::panel::PanelSide;
use paneldir::utils::format::format_size;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_help() {
    println!("paneldir {} - Dual-pane remote file browser", VERSION);
    println!();
    println!("USAGE:");
    println!("    paneldir [OPTIONS] [PATH]");
    println!();
    println!("ARGS:");
    println!("    [PATH]                  Directory to open in the active panel");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help              Print help information");
    println!("    -v, --version           Print version information");
    println!("    --url <URL>             File manager API base URL");
    println!("    --disk <DISK>           Disk of the active panel");
    println!("    --settings <FILE>       Settings file (default ~/.paneldir/settings.json)");
    println!();
    println!("Set RUST_LOG (e.g. RUST_LOG=paneldir=debug) for diagnostics on stderr.");
}

fn print_version() {
    println!("paneldir {}", VERSION);
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn option_value(args: &[String], i: usize, name: &str) -> String {
    match args.get(i + 1) {
        Some(value) => value.clone(),
        None => {
            eprintln!("Error: {} requires an argument", name);
            eprintln!("Run 'paneldir --help' for usage.");
            std::process::exit(1);
        }
    }
}

fn print_app(app: &App) {
    println!("[tree: {}]", app.tree.disk());
    for row in app.tree_rows() {
        let marker = if row.node.props.show_subdirectories {
            "v"
        } else if row.node.props.has_subdirectories {
            ">"
        } else {
            " "
        };
        println!("{}{} {}", "  ".repeat(row.depth), marker, row.node.basename);
    }
    println!();

    let panel = app.active_panel();
    println!(
        "[{}] {}:/{}",
        panel.side().as_str(),
        panel.selected_disk(),
        panel.selected_directory().unwrap_or("")
    );
    for dir in panel.directories() {
        println!("{:>10}  {:16}  {}/", "<DIR>", "", dir.basename);
    }
    for file in panel.files() {
        let modified = file
            .modified()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{:>10}  {:16}  {}", format_size(file.size), modified, file.basename);
    }
    println!("{}", panel.summary());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut url: Option<String> = None;
    let mut disk: Option<String> = None;
    let mut settings_path: Option<PathBuf> = None;
    let mut open_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                print_version();
                return;
            }
            "--url" => {
                url = Some(option_value(&args, i, "--url"));
                i += 2;
            }
            "--disk" => {
                disk = Some(option_value(&args, i, "--disk"));
                i += 2;
            }
            "--settings" => {
                settings_path = Some(PathBuf::from(option_value(&args, i, "--settings")));
                i += 2;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Error: unknown option '{}'", arg);
                eprintln!("Run 'paneldir --help' for usage.");
                std::process::exit(1);
            }
            arg => {
                if open_path.is_some() {
                    eprintln!("Error: only one PATH may be given");
                    std::process::exit(1);
                }
                open_path = Some(arg.to_string());
                i += 1;
            }
        }
    }

    let loaded = match settings_path.as_deref() {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = url {
        settings.base_url = url;
    }
    if let Some(disk) = disk {
        match PanelSide::parse(&settings.active_panel) {
            PanelSide::Right => settings.right_panel.disk = disk,
            PanelSide::Left => settings.left_panel.disk = disk,
        }
    }

    let service = match HttpDirectoryService::from_settings(&settings) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut app = App::new(settings, service);
    let mut outcome = app.initialize().await;
    if let Some(path) = open_path {
        outcome = outcome.and(app.open(&path).await);
    }

    print_app(&app);

    let errors = app.messages.errors();
    for error in errors {
        eprintln!("Error: {}", error.message);
    }
    if let Err(e) = outcome {
        if errors.is_empty() {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
    if !errors.is_empty() {
        std::process::exit(1);
    }
}
