//! Application entry point building the Actix-Web server.
use dotenvy::dotenv;

use pushkind_admin::{loader::ConfigLoader, logging, run};

#[actix_web::main]
async fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();

    let config = match ConfigLoader::from_env().load() {
        Ok(config) => config,
        Err(err) => {
            env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
            log::error!("Error loading config: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = logging::init(&config.logging) {
        eprintln!("Error initializing logging: {err}");
    }

    if config.print_config {
        log::info!("Loaded configuration: {:#?}", config.redacted());
    }

    match run(config).await {
        Ok(_) => log::info!("Server stopped"),
        Err(err) => {
            log::error!("Error starting server: {}", err);
            std::process::exit(1);
        }
    }
}
