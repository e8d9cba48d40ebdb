// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{LevelFilter, info};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use webui::app_state::AppState;
use webui::backend::Backend;
use webui::config::{ApiBackend, Config, ValidatedConfig};
use webui::iam::{SessionMiddlewareFactory, hash_password};
use webui::login::LoginSessionStore;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    match parsed_args.mode {
        RunMode::Help => {
            print!("{}", help_text());
            0
        }
        RunMode::HashPassword(password) => match hash_password(&password) {
            Ok(hash) => {
                println!("{}", hash);
                0
            }
            Err(error) => {
                eprintln!("❌ Failed to hash password: {}", error);
                1
            }
        },
        RunMode::Serve => {
            let validated_config = match Config::load_and_validate(&parsed_args.runtime_root) {
                Ok(config) => config,
                Err(error) => {
                    eprintln!("❌ {}", error);
                    eprintln!("❌ Application cannot start with invalid configuration.");
                    return 1;
                }
            };

            match System::new().block_on(run_server(validated_config)) {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("❌ Server failed to start: {}", error);
                    1
                }
            }
        }
    }
}

async fn run_server(validated_config: ValidatedConfig) -> std::io::Result<()> {
    init_logging(&validated_config).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;
    log_startup_info(&validated_config);

    let backend = Backend::from_config(&validated_config.api).map_err(|error| {
        eprintln!("❌ Failed to initialize the API client: {}", error);
        std::io::Error::other(error.to_string())
    })?;
    let sessions = LoginSessionStore::from_config(&validated_config.session);
    let app_state = Arc::new(AppState::new(&validated_config, backend, sessions));
    info!(
        "✅ App state initialized with app name: {}",
        validated_config.app.name
    );

    let workers = validated_config.server.workers;
    let address = (
        validated_config.server.host.clone(),
        validated_config.server.port,
    );
    let validated_config = Arc::new(validated_config);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(validated_config.clone()))
            .app_data(web::Data::from(app_state.clone()))
            .wrap(SessionMiddlewareFactory)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(webui::configure)
            .default_service(web::to(webui::not_found))
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await
}

fn init_logging(config: &ValidatedConfig) -> Result<(), log::SetLoggerError> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .target(env_logger::Target::Stdout)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init()
}

fn log_startup_info(config: &ValidatedConfig) {
    info!("Starting {}", config.app.name);
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on http://{}:{}",
        config.server.host, config.server.port
    );
    info!("Public URL: {}", config.public_base_url());
    match config.api.backend {
        ApiBackend::Http => info!(
            "Configuration server: {} as client {}",
            config.api.url, config.api.client_name
        ),
        ApiBackend::Memory => info!("Configuration server: in-memory"),
    }
    info!(
        "Sessions: cookie {}, {} minute idle timeout",
        config.session.cookie_name, config.session.ttl_minutes
    );
    info!("Configured users: {}", config.users.len());

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

fn help_text() -> &'static str {
    "Usage: webui [-C <root>] [command]\n\
     \n\
     Without a command, starts the console using <root>/config.yaml.\n\
     \n\
     Commands:\n\
     \x20 hash-password <password>  Print an argon2 hash for a users entry\n\
     \x20 help                      Show this text\n"
}

#[derive(Debug)]
enum RunMode {
    Serve,
    HashPassword(String),
    Help,
}

struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = args.into_iter().collect();
    if args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(ParsedArgs {
            runtime_root: PathBuf::from("."),
            mode: RunMode::Help,
        });
    }

    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut command_tokens = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else {
            command_tokens.push(arg);
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;

    let mode = match command_tokens.as_slice() {
        [] => RunMode::Serve,
        [command] if command.eq_ignore_ascii_case("help") => RunMode::Help,
        [command, password] if command == "hash-password" => {
            RunMode::HashPassword(password.clone())
        }
        [command] if command == "hash-password" => {
            return Err("hash-password needs a password argument".to_string());
        }
        _ => return Err(format!("Unknown command: {}", command_tokens.join(" "))),
    };

    Ok(ParsedArgs { runtime_root, mode })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{RunMode, parse_args_from};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_serve() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "runtime"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Serve));
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_ignores_double_dash() {
        let parsed = parse_args_from(args(&["--", "-C", "runtime"])).expect("parse args");
        assert!(parsed.runtime_root.ends_with("runtime"));
    }

    #[test]
    fn parse_args_reads_hash_password() {
        let parsed = parse_args_from(args(&["hash-password", "s3cret"])).expect("parse args");
        match parsed.mode {
            RunMode::HashPassword(password) => assert_eq!(password, "s3cret"),
            other => panic!("expected hash-password mode, got {:?}", other),
        }
    }

    #[test]
    fn parse_args_rejects_hash_password_without_value() {
        match parse_args_from(args(&["hash-password"])) {
            Err(error) => assert!(error.contains("password")),
            Ok(_) => panic!("expected missing password rejection"),
        }
    }

    #[test]
    fn parse_args_rejects_unknown_commands() {
        assert!(parse_args_from(args(&["system", "ping"])).is_err());
    }

    #[test]
    fn parse_args_accepts_help_flag() {
        let parsed = parse_args_from(args(&["--help", "hash-password"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Help));
    }

    #[test]
    fn parse_args_accepts_help_command_with_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "runtime", "help"])).expect("parse args");
        assert!(matches!(parsed.mode, RunMode::Help));
    }
}
