mod errors;
mod handlers;
mod models;
mod registry;
mod utils;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::info;
use std::env;

use crate::registry::UploadRegistry;
use crate::utils::storage::Storage;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let port = env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

    // Create the storage root (and its staging area) before accepting requests
    let storage = web::Data::new(Storage::new(&upload_dir)?);
    let registry = web::Data::new(UploadRegistry::new());

    info!("Starting server at 0.0.0.0:{port}");

    // Start the HTTP server
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(storage.clone())
            .app_data(registry.clone())
            .configure(handlers::pdf::configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
