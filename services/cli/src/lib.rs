mod cli;
mod commands;
mod infra;

use admission_risk::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
