use crate::error::{RagError, Result};
use crate::index::{Chunk, DenseMatrix, TfidfIndex, Vocabulary};
use crate::tokenizer::Analyzer;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub created_at: String,
    pub chunk_count: usize,
    pub document_count: usize,
    pub vocabulary_size: usize,
    pub analyzer: Analyzer,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn chunks(&self) -> PathBuf { self.root.join("chunks.json") }
    pub fn vocabulary(&self) -> PathBuf { self.root.join("vocabulary.json") }
    pub fn matrix(&self) -> PathBuf { self.root.join("tfidf_matrix.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    fn all(&self) -> [PathBuf; 4] { [self.chunks(), self.vocabulary(), self.matrix(), self.meta()] }

    /// True only when every artifact is present.
    pub fn exists(&self) -> bool { self.all().iter().all(|p| p.is_file()) }
}

/// `root` with `suffix` appended to its last component, e.g. `index` -> `index.staging`.
fn sibling(root: &Path, suffix: &str) -> Result<PathBuf> {
    let name = root.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("index path {} has no directory name", root.display()))
    })?;
    let mut name = name.to_os_string();
    name.push(suffix);
    Ok(root.with_file_name(name))
}

fn remove_quietly(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        tracing::warn!(path = %dir.display(), error = %e, "could not remove leftover index directory");
    }
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(path)?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    Ok(buf)
}

fn write_artifacts(paths: &IndexPaths, index: &TfidfIndex) -> Result<()> {
    let meta = MetaFile {
        version: FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        chunk_count: index.chunks.len(),
        document_count: index.document_count,
        vocabulary_size: index.vocabulary.len(),
        analyzer: index.analyzer,
    };
    let payloads: [(PathBuf, Vec<u8>); 4] = [
        (paths.chunks(), serde_json::to_vec_pretty(&index.chunks)?),
        (paths.vocabulary(), serde_json::to_vec(&index.vocabulary)?),
        (paths.matrix(), bincode::serialize(&index.matrix)?),
        (paths.meta(), serde_json::to_vec_pretty(&meta)?),
    ];
    for (path, bytes) in &payloads {
        let mut f = File::create(path)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    Ok(())
}

/// Replace `root` with the fully written `staging` directory. If the second rename fails the
/// previous index is moved back, so `root` never mixes artifacts from two builds.
fn swap_in(staging: &Path, root: &Path) -> Result<()> {
    if !root.exists() {
        fs::rename(staging, root)?;
        return Ok(());
    }
    let backup = sibling(root, ".old")?;
    if backup.is_dir() {
        fs::remove_dir_all(&backup)?;
    }
    fs::rename(root, &backup)?;
    if let Err(e) = fs::rename(staging, root) {
        fs::rename(&backup, root)?;
        return Err(e.into());
    }
    remove_quietly(&backup);
    Ok(())
}

/// Write the whole index into a sibling staging directory, then swap it in for `paths.root`.
/// The output directory belongs to the index: anything else inside it is replaced too.
/// On failure the staging directory is removed and any previous index stays as it was.
pub fn save_index(paths: &IndexPaths, index: &TfidfIndex) -> Result<()> {
    let staging = sibling(&paths.root, ".staging")?;
    if staging.is_dir() {
        // left by an interrupted build
        fs::remove_dir_all(&staging)?;
    }
    if let Some(parent) = staging.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all(parent)?;
    }
    fs::create_dir(&staging)?;

    let result = write_artifacts(&IndexPaths::new(&staging), index).and_then(|()| swap_in(&staging, &paths.root));
    if result.is_err() && staging.exists() {
        remove_quietly(&staging);
    }
    result
}

pub fn load_chunks(paths: &IndexPaths) -> Result<Vec<Chunk>> {
    Ok(serde_json::from_slice(&read_bytes(&paths.chunks())?)?)
}

pub fn load_vocabulary(paths: &IndexPaths) -> Result<Vocabulary> {
    Ok(serde_json::from_slice(&read_bytes(&paths.vocabulary())?)?)
}

pub fn load_matrix(paths: &IndexPaths) -> Result<DenseMatrix> {
    Ok(bincode::deserialize(&read_bytes(&paths.matrix())?)?)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    Ok(serde_json::from_slice(&read_bytes(&paths.meta())?)?)
}

/// Load a built index exactly as persisted: no refitting, no reordering.
pub fn load_index(paths: &IndexPaths) -> Result<TfidfIndex> {
    if !paths.exists() {
        return Err(RagError::IndexNotFound { path: paths.root.clone() });
    }
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(RagError::CorruptIndex(format!("unsupported format version {}", meta.version)));
    }
    let chunks = load_chunks(paths)?;
    let vocabulary = load_vocabulary(paths)?;
    let matrix = load_matrix(paths)?;

    if !vocabulary.is_consistent() {
        return Err(RagError::CorruptIndex("vocabulary columns are not a permutation of 0..len".into()));
    }
    if !matrix.is_well_formed() {
        return Err(RagError::CorruptIndex(format!(
            "matrix declares {}x{} but holds {} values",
            matrix.rows,
            matrix.cols,
            matrix.data.len()
        )));
    }
    if matrix.rows as usize != chunks.len() || matrix.cols as usize != vocabulary.len() {
        return Err(RagError::CorruptIndex(format!(
            "matrix is {}x{}, expected {}x{}",
            matrix.rows,
            matrix.cols,
            chunks.len(),
            vocabulary.len()
        )));
    }
    if meta.chunk_count != chunks.len() || meta.vocabulary_size != vocabulary.len() {
        return Err(RagError::CorruptIndex("meta.json disagrees with artifacts".into()));
    }

    tracing::info!(
        chunks = chunks.len(),
        documents = meta.document_count,
        vocabulary = vocabulary.len(),
        created_at = %meta.created_at,
        "index loaded"
    );
    Ok(TfidfIndex { chunks, vocabulary, matrix, analyzer: meta.analyzer, document_count: meta.document_count })
}
