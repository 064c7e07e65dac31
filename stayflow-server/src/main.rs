use std::{env, sync::Arc};

use colored::Colorize;
use log::{error, info};
use stayflow_collab::{PgDatabase, StayFlow};
use stayflow_server::{init_logger, run_server, ServerContext};
use thiserror::Error;

#[derive(Debug, Error)]
enum StartError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,

    #[error("Could not connect to database: {0}")]
    Database(#[from] stayflow_collab::DatabaseError),

    #[error("{0}")]
    Serve(#[from] stayflow_server::ServeError),
}

impl StartError {
    fn hint(&self) -> String {
        match self {
            StartError::MissingDatabaseUrl => {
                "Set DATABASE_URL to a Postgres connection string, for example postgres://localhost/stayflow.".to_string()
            }
            StartError::Database(_) => {
                "This is a database error. Make sure the Postgres instance is running and the migrations have been applied, then try again.".to_string()
            }
            StartError::Serve(_) => {
                "Check that the port is free, or set STAYFLOW_SERVER_PORT to a different one.".to_string()
            }
        }
    }
}

async fn start() -> Result<(), StartError> {
    let url = env::var("DATABASE_URL").map_err(|_| StartError::MissingDatabaseUrl)?;

    info!("Connecting to database...");
    let database = PgDatabase::new(&url).await?;

    let stayflow = StayFlow::new(database);
    let context = ServerContext {
        stayflow: Arc::new(stayflow),
    };

    info!("Initialized successfully.");
    run_server(context).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    init_logger();

    if let Err(error) = start().await {
        error!(
            "{} Read the error below to troubleshoot the issue.",
            "StayFlow failed to start!".bold().red()
        );
        error!("{}", error);
        error!("{}", format!("Hint: {}", error.hint()).dimmed().italic());
    }
}
