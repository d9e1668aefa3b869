use std::collections::HashMap;
use std::sync::Mutex;

use mongodb::{Client as MongoClient, Database};

use crate::config::Config;
use crate::models::session::QuizSession;

pub struct AppState {
    pub config: Config,
    pub mongo: Database,
    /// Active quiz sessions, keyed by session id. A session lives here for
    /// one attempt only; it is removed when the user discards it and
    /// purged after `config.session_ttl_seconds`.
    pub sessions: Mutex<HashMap<String, QuizSession>>,
}

impl AppState {
    pub fn new(config: Config, mongo_client: MongoClient) -> Self {
        let mongo = mongo_client.database(&config.mongo_database);

        Self {
            config,
            mongo,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

pub mod auth_service;
pub mod quiz_service;
pub mod session_service;
