//! Terminal client for an online class marketplace.
//!
//! Browse and buy classes as a student, publish them as an instructor, or
//! moderate as an admin, from a line prompt or a full-screen TUI.

use anyhow::{Context, Result};
use class_market::{ClientConfig, ConfigOverrides};
use cm_client::{
    app::{App, Services},
    commands::Command,
    logging, repl,
    tui_app::TuiApp,
};
use log::info;
use pico_args::Arguments;
use std::path::PathBuf;

const HELP: &str = "\
Connect to a class marketplace backend

USAGE:
  cm_client [OPTIONS]

OPTIONS:
  --server URL          Backend URL  [default: $API_BASE_URL or http://localhost:5000]
  --data-dir DIR        Where the session and progress are kept  [default: .class_market]
  --email EMAIL         Sign in with this email on start
  --password PASS       Password for --email
  --tui                 Use TUI (Terminal UI) mode [default: false]

FLAGS:
  -h, --help            Print help information

ENVIRONMENT:
  IDENTITY_API_KEY, STRIPE_PUBLISHABLE_KEY, IMAGE_HOST_KEY and the other
  settings are read from the environment or a .env file.
";

struct Args {
    server_url: Option<String>,
    data_dir: Option<PathBuf>,
    email: Option<String>,
    password: Option<String>,
    use_tui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server_url: pargs.opt_value_from_str("--server")?,
        data_dir: pargs.opt_value_from_str("--data-dir")?,
        email: pargs.opt_value_from_str("--email")?,
        password: pargs.opt_value_from_str("--password")?,
        use_tui: pargs.contains("--tui"),
    };

    dotenvy::dotenv().ok();
    run(args).await
}

async fn run(args: Args) -> Result<()> {
    let config = ClientConfig::from_env(ConfigOverrides {
        api_base_url: args.server_url,
        data_dir: args.data_dir,
    })
    .context("Invalid configuration")?;
    config.validate().context("Invalid configuration")?;

    let log_file = args.use_tui.then(|| config.data_dir.join("cm_client.log"));
    logging::init(log_file.as_deref())?;
    info!("Using backend {}", config.api_base_url);

    let mut app = App::new(Services::from_config(&config)?);

    if let (Some(email), Some(password)) = (args.email, args.password) {
        app.start().await;
        for notice in app.handle(Command::Login { email, password }).await {
            println!("{}", notice.text);
        }
    }

    if args.use_tui {
        let terminal = ratatui::init();
        let result = TuiApp::new(app).run(terminal).await;
        ratatui::restore();
        result
    } else {
        repl::run(app).await
    }
}
