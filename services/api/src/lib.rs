mod auth;
mod cli;
mod extract;
mod infra;
mod routes;
mod server;
mod uploads;

use edumarket::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
