//! Content hash identifying one year's inputs.

use crate::dataset::input_files;
use crate::StoreResult;
use sha2::{Digest, Sha256};
use sio_project::ProjectConfig;
use std::fs::File;
use std::path::Path;

/// SHA-256 over the configuration and the bytes of every input file.
pub fn compute_input_hash(dir: &Path, config: &ProjectConfig) -> StoreResult<String> {
    let mut hasher = Sha256::new();

    let config_json = serde_json::to_string(config)?;
    hasher.update(config_json.as_bytes());

    for path in input_files(dir, config) {
        let mut file = File::open(&path)?;
        std::io::copy(&mut file, &mut hasher)?;
    }

    let result = hasher.finalize();
    Ok(format!("{:x}", result))
}
