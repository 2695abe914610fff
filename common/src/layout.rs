use std::path::{Path, PathBuf};

use crate::task::TaskId;

pub const SHARDS_DIR: &str = "temp";
pub const INTERMEDIATE_DIR: &str = "intermediate";
pub const OUTPUT_DIR: &str = "out";

/// Rutas compartidas entre coordinator y workers (todas relativas a `root`).
///
/// - `temp/<shard>.txt`: entrada de cada tarea map
/// - `intermediate/mr-<map>-<bucket>.txt`: salida map / entrada reduce
/// - `out/<bucket>.txt`: salida de cada tarea reduce
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsLayout {
    root: PathBuf,
}

impl FsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shards_dir(&self) -> PathBuf {
        self.root.join(SHARDS_DIR)
    }

    pub fn intermediate_dir(&self) -> PathBuf {
        self.root.join(INTERMEDIATE_DIR)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    pub fn shard_path(&self, shard_id: TaskId) -> PathBuf {
        self.shards_dir().join(format!("{}.txt", shard_id))
    }

    pub fn intermediate_path(&self, map_id: TaskId, bucket_id: TaskId) -> PathBuf {
        self.intermediate_dir()
            .join(format!("mr-{}-{}.txt", map_id, bucket_id))
    }

    pub fn output_path(&self, bucket_id: TaskId) -> PathBuf {
        self.output_dir().join(format!("{}.txt", bucket_id))
    }
}

impl Default for FsLayout {
    fn default() -> Self {
        Self::new(".")
    }
}
