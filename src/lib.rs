use std::path::Path;

use actix_files::Files;
use actix_web::{
    App, HttpServer,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{Compress, Condition, Logger},
    web,
};

use crate::middleware::{GzipExclusion, RecoverPanic};
use crate::models::config::Config;

pub mod loader;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod routes;

/// Application factory: routes, static assets and the middleware enabled
/// by `config`.
pub fn app(
    config: web::Data<Config>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let mut app = App::new().app_data(config.clone());

    if config.http.max_content_length > 0 {
        let limit = usize::try_from(config.http.max_content_length).unwrap_or(usize::MAX);
        app = app
            .app_data(web::PayloadConfig::new(limit))
            .app_data(web::JsonConfig::default().limit(limit));
    }

    // An empty scope would swallow every path, including the static files below.
    let api_path = config.http.api_path();
    app = if api_path.is_empty() {
        app.service(routes::main::health)
    } else {
        app.service(web::scope(&api_path).service(routes::main::health))
    };

    let www = &config.www;
    if !www.root_dir.is_empty() && Path::new(&www.root_dir).is_dir() {
        let mut files = Files::new("/", &www.root_dir);
        if !www.index.is_empty() {
            files = files.index_file(&www.index);
        }
        app = app.service(files);
    } else if !www.root_dir.is_empty() {
        log::warn!("Static directory {} not found, skipping", www.root_dir);
    }

    // GzipExclusion must stay inside Compress: it marks excluded responses
    // before the encoder sees them.
    app.wrap(Condition::new(
        config.gzip.enable,
        GzipExclusion::new(config.gzip.clone()),
    ))
    .wrap(Condition::new(config.gzip.enable, Compress::default()))
    .wrap(Condition::new(
        config.cors.enable,
        middleware::cors(&config.cors),
    ))
    .wrap(Condition::new(config.middle_config.recover, RecoverPanic))
    .wrap(Condition::new(config.middle_config.logger, Logger::default()))
}

pub async fn run(config: Config) -> std::io::Result<()> {
    let address = config.http.bind_address();
    let shutdown_timeout = config.http.shutdown_timeout;
    let config = web::Data::new(config);

    log::info!("Starting server at http://{}:{}", address.0, address.1);

    let mut server = HttpServer::new(move || app(config.clone())).bind(address)?;
    if shutdown_timeout > 0 {
        server = server.shutdown_timeout(shutdown_timeout);
    }
    server.run().await
}
