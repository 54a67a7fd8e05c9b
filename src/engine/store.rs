//! On-disk model file.
//!
//! One CBOR file holds the documents and the trained model together. Writes go
//! to `<path>.tmp` first and are renamed over `<path>`, so a reader sees either
//! the old file or the new one.

use std::{
    collections::HashSet,
    ffi::OsString,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    document::Document,
    error::{Error, Result},
    vectorizer::{serde::TFIDFData, tfidf::TFIDFEngine, Vectorizer},
};

/// Bumped whenever the layout of `ModelFile` changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFile {
    pub version: u32,
    pub documents: Vec<Document>,
    pub model: TFIDFData,
}

impl ModelFile {
    pub fn new(documents: Vec<Document>, model: TFIDFData) -> Self {
        Self { version: FORMAT_VERSION, documents, model }
    }

    /// Check the file and build the vectorizer it describes
    pub fn into_parts<E>(self) -> Result<(Vec<Document>, Vectorizer<E>)>
    where
        E: TFIDFEngine,
    {
        if self.version != FORMAT_VERSION {
            return Err(Error::CorruptModel(format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        if self.documents.len() != self.model.weights.len() {
            return Err(Error::CorruptModel(format!(
                "{} documents but {} weight rows",
                self.documents.len(),
                self.model.weights.len()
            )));
        }
        let mut ids = HashSet::with_capacity(self.documents.len());
        if let Some(dup) = self.documents.iter().find(|d| !ids.insert(d.id.as_str())) {
            return Err(Error::CorruptModel(format!("duplicate document id {:?}", dup.id)));
        }
        let vectorizer = self.model.into_vectorizer()?;
        Ok((self.documents, vectorizer))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `file` to `path` through a temporary file and a rename
pub fn write(path: &Path, file: &ModelFile) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let tmp = tmp_path(path);
    let result = (|| {
        let out = File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
        let mut writer = BufWriter::new(out);
        serde_cbor::to_writer(&mut writer, file).map_err(Error::Encode)?;
        writer.flush().map_err(|e| Error::io(&tmp, e))?;
        writer.get_ref().sync_all().map_err(|e| Error::io(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
    })();
    if result.is_err() {
        // leftover temp file is useless; the target was not touched
        let _ = fs::remove_file(&tmp);
    }
    result?;
    info!(path = %path.display(), documents = file.documents.len(), "model saved");
    Ok(())
}

/// Read a model file. The contents are not validated here, see `ModelFile::into_parts`.
pub fn read(path: &Path) -> Result<ModelFile> {
    let input = File::open(path).map_err(|e| Error::io(path, e))?;
    let file: ModelFile = serde_cbor::from_reader(BufReader::new(input)).map_err(Error::Decode)?;
    debug!(path = %path.display(), version = file.version, "model file decoded");
    Ok(file)
}
