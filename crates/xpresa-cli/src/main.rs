// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use config::Config;
use runtime::DbRuntime;
use std::env;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{info, warn};
use xpresa_app::{AppState, Location, PersistedSession, Session, SessionSource};
use xpresa_db::{ProfileRepository, Store};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `xpresa --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    let start = match &options.location {
        Some(href) => Location::parse(href).with_context(|| {
            format!("invalid --location {href:?}; pass an in-app path such as /dashboard?status=pendiente")
        })?,
        None => config.start_location()?,
    };

    logging::init(&config)?;
    info!(db = %db_path.display(), demo = options.demo, start = %start, "starting xpresa");

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or XPRESA_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    let (session, session_path) = if options.demo {
        let seller = store.seed_demo_data()?;
        (
            Session::resolve(Some(seller), None, OffsetDateTime::now_utc()),
            None,
        )
    } else {
        let session_path = config.session_path()?;
        let session = resolve_session(&store, &config, &session_path)?;
        (session, Some(session_path))
    };
    if options.check_only {
        return Ok(());
    }

    let mut state = AppState::new(start);
    let mut runtime =
        DbRuntime::new(&store, session).with_recent_expenses(config.recent_expenses());
    if let Some(path) = session_path {
        runtime = runtime.with_session_path(path);
    }
    xpresa_tui::run_app(&mut state, &mut runtime)
}

/// The configured profile outranks the session file. A server profile is
/// written back to the file so the next start can fall back to it.
fn resolve_session(store: &Store, config: &Config, session_path: &Path) -> Result<Session> {
    let server = match config.user_id() {
        Some(user_id) => {
            let profile = store.get_profile(user_id)?;
            if profile.is_none() {
                warn!(
                    user_id = user_id.get(),
                    "configured session.user_id has no profile"
                );
            }
            profile
        }
        None => None,
    };
    let persisted = xpresa_db::load_session_file(session_path)?;

    let session = Session::resolve(server, persisted, OffsetDateTime::now_utc());
    if let Some(profile) = session.profile()
        && session.source() == Some(SessionSource::Server)
    {
        let persisted = PersistedSession::for_profile(profile);
        if let Err(error) = xpresa_db::write_session_file(session_path, &persisted) {
            warn!(error = %format!("{error:#}"), "could not persist session");
        }
    }
    info!(
        signed_in = session.is_signed_in(),
        source = ?session.source(),
        "resolved session"
    );
    Ok(session)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    location: Option<String>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        location: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--location" => {
                let value = iter.next().ok_or_else(|| {
                    anyhow::anyhow!("--location requires an href such as /dashboard?status=pagado")
                })?;
                options.location = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("xpresa");
    println!("  --config <path>          Use a specific config path");
    println!("  --location <href>        Start at this location (for example /dashboard?status=pendiente)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config + DB + session and exit");
    println!("  --help                   Show this help");
}
