//! Durable pending-operation storage for namechain.

pub mod queue;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::queue::{Queue, QueueBackend};

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub root_dir: PathBuf,
    pub queue_backend: QueueBackend,
}

impl StoreConfig {
    pub fn local_dev<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root = root_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root_dir: root,
            queue_backend: QueueBackend::default(),
        })
    }
}

pub struct Store {
    cfg: StoreConfig,
    queue: Queue,
}

impl Store {
    pub fn open(cfg: StoreConfig) -> Result<Self> {
        let queue = Queue::open(&cfg.root_dir, cfg.queue_backend.clone())?;
        Ok(Self { cfg, queue })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}
