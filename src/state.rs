use std::sync::Arc;

use crate::{
    config::Config,
    database::{KvStore, RedisStore, init_redis},
};

pub struct AppState {
    pub config: Config,
    pub kv: Arc<dyn KvStore>,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let connection = init_redis(&config.redis_url).await;

        Arc::new(Self {
            config,
            kv: Arc::new(RedisStore::new(connection)),
        })
    }
}
