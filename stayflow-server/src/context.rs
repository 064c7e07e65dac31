use std::sync::Arc;

use axum::extract::FromRef;
use stayflow_collab::{PgDatabase, StayFlow};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub stayflow: Arc<StayFlow<PgDatabase>>,
}
