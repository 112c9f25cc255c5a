//! Model artifacts on disk.
//!
//! A model is stored as three CBOR files sharing one prefix:
//! - `<prefix>`: the scorer network
//! - `<prefix>_vectorizer.pkl`: the fitted content vectorizer
//! - `<prefix>_embeddings.pkl`: user and post embeddings
//!
//! All three are written by the same `save` and must be read together.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::{
    error::Result,
    recommender::{embedding::EmbeddingStore, network::ScorerNetwork},
    vectorizer::ContentVectorizer,
};

const VECTORIZER_SUFFIX: &str = "_vectorizer.pkl";
const EMBEDDINGS_SUFFIX: &str = "_embeddings.pkl";

/// Paths of the three artifacts of one model prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub network: PathBuf,
    pub vectorizer: PathBuf,
    pub embeddings: PathBuf,
}

impl ArtifactPaths {
    pub fn new(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref();
        Self {
            network: prefix.to_path_buf(),
            vectorizer: with_suffix(prefix, VECTORIZER_SUFFIX),
            embeddings: with_suffix(prefix, EMBEDDINGS_SUFFIX),
        }
    }

    pub fn exists(&self) -> bool {
        self.network.exists()
    }
}

fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(prefix.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Everything a trained model needs at serve time
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub network: ScorerNetwork,
    pub vectorizer: ContentVectorizer,
    pub embeddings: EmbeddingStore,
}

/// Write the three artifacts, creating missing parent directories. Existing files are overwritten.
pub fn save(
    paths: &ArtifactPaths,
    network: &ScorerNetwork,
    vectorizer: &ContentVectorizer,
    embeddings: &EmbeddingStore,
) -> Result<()> {
    if let Some(parent) = paths.network.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_cbor(&paths.network, network)?;
    write_cbor(&paths.vectorizer, vectorizer)?;
    write_cbor(&paths.embeddings, embeddings)?;
    info!(path = %paths.network.display(), "saved model");
    Ok(())
}

/// Read a snapshot back. `Ok(None)` when no model has been saved under the prefix.
pub fn load(paths: &ArtifactPaths) -> Result<Option<ModelSnapshot>> {
    if !paths.exists() {
        debug!(path = %paths.network.display(), "no saved model");
        return Ok(None);
    }
    let network: ScorerNetwork = read_cbor(&paths.network)?;
    network.validate()?;
    let snapshot = ModelSnapshot {
        network,
        vectorizer: read_cbor(&paths.vectorizer)?,
        embeddings: read_cbor(&paths.embeddings)?,
    };
    info!(
        path = %paths.network.display(),
        users = snapshot.embeddings.user_embeddings.len(),
        posts = snapshot.embeddings.post_embeddings.len(),
        "loaded model"
    );
    Ok(Some(snapshot))
}

fn write_cbor<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_cbor::to_vec(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn read_cbor<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    Ok(serde_cbor::from_slice(&bytes)?)
}
