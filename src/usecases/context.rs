use std::sync::Arc;

use crate::{
    engine::{core_thread::CoreThread, memory::MemoryEngine},
    infra::config::AppConfig,
};

pub struct AppContext {
    pub config: AppConfig,
    pub core: CoreThread,
    pub engine: Arc<MemoryEngine>,
}

impl AppContext {
    pub fn new(config: AppConfig, core: CoreThread, engine: Arc<MemoryEngine>) -> Self {
        Self {
            config,
            core,
            engine,
        }
    }
}
