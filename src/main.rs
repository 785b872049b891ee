use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use taskboard::{config::Config, routes, AppContext};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(to_io)?;
    let ctx = AppContext::from_config(&config).await.map_err(to_io)?;

    log::info!("Starting taskboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(ctx.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}

fn to_io(err: taskboard::AppError) -> std::io::Error {
    log::error!("{}", err);
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}
