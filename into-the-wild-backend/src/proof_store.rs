use std::path::PathBuf;

use async_trait::async_trait;
use into_the_wild_registration::error::StoreError;
use into_the_wild_registration::store::ProofStorage;

/// Payment-proof blob storage on the local filesystem, addressed through
/// a configured public base URL.
pub struct FsProofStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsProofStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl ProofStorage for FsProofStore {
    async fn store(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        // Path segments include caller-supplied ids; nothing may escape
        // the storage root.
        if path
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(StoreError(format!("invalid proof path: {path}")));
        }
        let target = self.root.join(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|error| StoreError(error.to_string()))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|error| StoreError(error.to_string()))
    }

    fn reference_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}
