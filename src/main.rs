use clap::Parser;
use color_eyre::Result;
use petlog::{
    Board, Config, Profile,
    cli::{self, Cli, Commands},
};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev { Profile::Dev } else { Profile::Prod };

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path)?,
        None => Config::load_with_profile(profile)?,
    };

    let log_path = petlog::logging::init(&config.get_data_dir())?;
    tracing::info!(log = %log_path.display(), ?profile, "petlog starting");

    let board = Board::open(&config)?;
    let secret = config.admin_secret();

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = petlog::tui::App::new(config, board)?;
            petlog::tui::run_event_loop(app)?;
        }
        Commands::List { kind, json } => {
            cli::handle_list(kind, json, &board)?;
        }
        Commands::AddDiary { content, date, photo } => {
            let session = cli::session_for(cli.password.as_deref(), &secret)?;
            cli::handle_add_diary(content, date, photo, &session, &board)?;
        }
        Commands::AddNotice { content, date } => {
            let session = cli::session_for(cli.password.as_deref(), &secret)?;
            cli::handle_add_notice(content, date, &session, &board)?;
        }
        Commands::Edit { kind, id, date, content } => {
            let mut session = cli::session_for(cli.password.as_deref(), &secret)?;
            cli::handle_edit(kind, id, date, content, &mut session, &board)?;
        }
        Commands::Delete { kind, id } => {
            let mut session = cli::session_for(cli.password.as_deref(), &secret)?;
            cli::handle_delete(kind, id, &mut session, &board)?;
        }
    }

    Ok(())
}
