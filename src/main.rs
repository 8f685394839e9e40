use clap::CommandFactory;
use clap::Parser;
use colored::*;
use dialoguer::Password;
use env_logger::{Builder, Env, Target};
use indicatif::{ProgressBar, ProgressStyle};
use karaoke_search::cli::{AuthArgs, Cli, Commands};
use karaoke_search::config::Config;
use karaoke_search::error::{AccessError, KaraokeError, Result as KaraokeResult};
use karaoke_search::interactive::{InteractiveSession, SessionCommand, TerminalPrompter};
use karaoke_search::matcher::MatchMode;
use karaoke_search::output::OutputFormatter;
use karaoke_search::service::SearchService;
use karaoke_search::session::SessionState;
use log::{info, warn};
use std::fs;
use std::process::ExitCode;
use std::time::{Duration, Instant};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli) {
        eprintln!("{}", e.to_string().red());
        return ExitCode::FAILURE;
    }

    let start_time = Instant::now();
    info!("Application started with command: {:?}", cli.command);

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            return ExitCode::FAILURE;
        }
    };

    let status = match run(&cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e, &config);
            ExitCode::FAILURE
        }
    };

    info!(
        "Application finished. Total elapsed time: {:.2?}",
        start_time.elapsed()
    );
    status
}

fn load_config(cli: &Cli) -> KaraokeResult<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(data) = &cli.data {
        config.catalog.path = data.clone();
    }
    if let Some(mode) = cli.mode {
        config.access.mode = mode;
    }
    Ok(config)
}

fn run(cli: &Cli, config: &Config) -> KaraokeResult<()> {
    match &cli.command {
        Commands::Search {
            query,
            auth,
            regex,
            format,
        } => {
            let mode = if *regex {
                MatchMode::Regex
            } else {
                MatchMode::Substring
            };
            let service = build_service(config).with_match_mode(mode);
            warm_catalog(&service)?;

            let session = authenticate(&service, auth)?;
            let outcome = service.submit_query(&session, query)?;
            print!(
                "{}",
                OutputFormatter::new(*format).format_results(&outcome.matches, Some(query))?
            );
        }

        Commands::List {
            limit,
            auth,
            format,
        } => {
            let service = build_service(config);
            warm_catalog(&service)?;

            let session = authenticate(&service, auth)?;
            let rows = service.preview(&session, limit.unwrap_or(config.catalog.preview_limit))?;
            print!("{}", OutputFormatter::new(*format).format_results(&rows, None)?);
        }

        Commands::Session { auth, format } => {
            let service = build_service(config);
            if let Err(e) = warm_catalog(&service) {
                warn!("Catalog unavailable: {e}");
                eprintln!("{}", e.to_string().red());
            }

            let mut repl = InteractiveSession::new(&service, TerminalPrompter)
                .preview_limit(config.catalog.preview_limit)
                .signup_url(config.access.signup_url.clone())
                .format(*format);

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            if let Some(key) = &auth.embed_key {
                repl.handle(SessionCommand::Embed(key.clone()), &mut stdout)?;
            }
            if let Some(user) = &auth.user {
                repl.handle(
                    SessionCommand::Login {
                        identity: user.clone(),
                        secret: auth.password.clone(),
                    },
                    &mut stdout,
                )?;
            }
            repl.run(stdin.lock(), &mut stdout)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "karaoke-search", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn build_service(config: &Config) -> SearchService {
    SearchService::new(config.access_policy(), config.catalog_cache())
}

/// Load the catalog up front, with a spinner while the workbook is parsed.
fn warm_catalog(service: &SearchService) -> KaraokeResult<()> {
    let pb = ProgressBar::new_spinner().with_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .map_err(|e| KaraokeError::Other(e.to_string()))?
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.set_message("Loading catalog...");
    pb.enable_steady_tick(Duration::from_millis(80));

    let result = service.catalog_size();
    pb.finish_and_clear();

    let size = result?;
    info!("Catalog ready with {size} records");
    Ok(())
}

/// Turn the one-shot auth flags into a session.
fn authenticate(service: &SearchService, auth: &AuthArgs) -> KaraokeResult<SessionState> {
    let mut session = service.new_session();

    if let Some(key) = &auth.embed_key {
        session = service.authorize_embed(&session, key)?;
    }

    if auth.user.is_some() || auth.password.is_some() {
        let identity = auth.user.clone().unwrap_or_default();
        let secret = match &auth.password {
            Some(secret) => secret.clone(),
            None => Password::new()
                .with_prompt(format!("Password for {identity}"))
                .allow_empty_password(true)
                .interact()?,
        };
        session = service.login(&session, &identity, &secret)?;
    }

    Ok(session)
}

fn report_error(error: &KaraokeError, config: &Config) {
    eprintln!("{}", error.to_string().red());
    if let KaraokeError::Access(AccessError::LoginRequired) = error {
        eprintln!("Pass --user/--password to log in");
        if let Some(url) = &config.access.signup_url {
            eprintln!("No account yet? Sign up at {url}");
        }
    }
}

fn setup_logging(cli: &Cli) -> KaraokeResult<()> {
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir).map_err(KaraokeError::Io)?;
            }
        }
        let log_file = fs::File::create(log_path).map_err(KaraokeError::Io)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| KaraokeError::Other(e.to_string()))?;
    Ok(())
}
