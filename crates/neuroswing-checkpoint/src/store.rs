use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crate::{Checkpoint, CheckpointError};

const FILE_PREFIX: &str = "gen";
const FILE_SUFFIX: &str = ".json";

/// Parses the generation number out of a `gen<digits>.json` file name.
#[must_use]
pub fn parse_generation(file_name: &str) -> Option<u64> {
    let digits = file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns the largest generation among `names`, skipping names that do not parse.
pub fn newest_generation<I, S>(names: I) -> Option<u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| parse_generation(name.as_ref()))
        .max()
}

/// Directory of numbered checkpoint files.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new<P>(dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn file_name(generation: u64) -> String {
        format!("{FILE_PREFIX}{generation}{FILE_SUFFIX}")
    }

    #[must_use]
    pub fn path(&self, generation: u64) -> PathBuf {
        self.dir.join(Self::file_name(generation))
    }

    /// Writes `checkpoint` on a background thread.
    ///
    /// The caller is not blocked. The write is only known to be complete once
    /// the returned handle has been waited on.
    pub fn save(&self, checkpoint: Checkpoint) -> SaveHandle {
        let generation = checkpoint.generation;
        let store = self.clone();
        let spawned = thread::Builder::new()
            .name(format!("checkpoint-{generation}"))
            .spawn(move || store.save_blocking(&checkpoint));
        match spawned {
            Ok(handle) => SaveHandle {
                generation,
                state: SaveState::Running(handle),
            },
            Err(e) => {
                tracing::warn!(generation, error = %e, "failed to spawn checkpoint writer");
                SaveHandle {
                    generation,
                    state: SaveState::Failed(CheckpointError::Io {
                        path: self.path(generation),
                        source: e,
                    }),
                }
            }
        }
    }

    /// Writes `checkpoint` on the calling thread.
    ///
    /// The record is written to a temporary sibling and renamed into place so
    /// a reader never observes a partially written file.
    pub fn save_blocking(&self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        self.ensure_dir()?;
        let path = self.path(checkpoint.generation);
        let tmp_path = path.with_extension("json.tmp");
        let io_err = |source| CheckpointError::Io {
            path: tmp_path.clone(),
            source,
        };

        let file = File::create(&tmp_path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, checkpoint).map_err(|e| io_err(e.into()))?;
        writer.flush().map_err(io_err)?;
        drop(writer);

        fs::rename(&tmp_path, &path).map_err(|source| CheckpointError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(
            generation = checkpoint.generation,
            path = %path.display(),
            "checkpoint saved"
        );
        Ok(path)
    }

    /// Returns the newest generation present in the directory.
    ///
    /// The directory is created if it does not exist yet.
    pub fn latest_generation(&self) -> Result<Option<u64>, CheckpointError> {
        self.ensure_dir()?;
        let io_err = |source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        };
        let mut names = vec![];
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
        Ok(newest_generation(names))
    }

    /// Loads the checkpoint with the highest generation number, if any.
    pub fn load_latest(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        match self.latest_generation()? {
            Some(generation) => self.load(generation),
            None => Ok(None),
        }
    }

    /// Loads the checkpoint of `generation`.
    ///
    /// Returns `Ok(None)` if the file does not exist. Any other failure,
    /// including a file whose genome does not fit its topology, is an error.
    pub fn load(&self, generation: u64) -> Result<Option<Checkpoint>, CheckpointError> {
        let path = self.path(generation);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CheckpointError::Io { path, source }),
        };
        let checkpoint: Checkpoint = match serde_json::from_reader(BufReader::new(file)) {
            Ok(checkpoint) => checkpoint,
            Err(source) => return Err(CheckpointError::Parse { path, source }),
        };
        if let Err(source) = checkpoint.validate() {
            return Err(CheckpointError::Invalid { path, source });
        }
        if checkpoint.generation != generation {
            return Err(CheckpointError::GenerationMismatch {
                path,
                expected: generation,
                found: checkpoint.generation,
            });
        }
        Ok(Some(checkpoint))
    }

    fn ensure_dir(&self) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        })
    }
}

/// Handle to a checkpoint write started by [`CheckpointStore::save`].
#[derive(Debug)]
pub struct SaveHandle {
    generation: u64,
    state: SaveState,
}

#[derive(Debug)]
enum SaveState {
    Running(JoinHandle<Result<PathBuf, CheckpointError>>),
    Failed(CheckpointError),
}

impl SaveHandle {
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        match &self.state {
            SaveState::Running(handle) => handle.is_finished(),
            SaveState::Failed(_) => true,
        }
    }

    /// Blocks until the write has completed and returns the written path.
    pub fn wait(self) -> Result<PathBuf, CheckpointError> {
        let generation = self.generation;
        match self.state {
            SaveState::Running(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => Err(CheckpointError::WriterPanicked { generation }),
            },
            SaveState::Failed(e) => Err(e),
        }
    }
}

/// Outstanding checkpoint writes.
#[derive(Debug, Default)]
pub struct PendingSaves {
    handles: Vec<SaveHandle>,
}

impl PendingSaves {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: SaveHandle) {
        self.handles.push(handle);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Number of writes that have not finished yet.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Collects writes that have already finished without blocking.
    ///
    /// Returns the first failure among them.
    pub fn reap(&mut self) -> Result<(), CheckpointError> {
        let (finished, running): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(SaveHandle::is_finished);
        self.handles = running;
        wait_all(finished).map(|_| ())
    }

    /// Waits for every outstanding write and returns how many completed.
    ///
    /// All writes are waited on even if one fails; the first failure is returned.
    pub fn drain(&mut self) -> Result<usize, CheckpointError> {
        wait_all(std::mem::take(&mut self.handles))
    }
}

fn wait_all(handles: Vec<SaveHandle>) -> Result<usize, CheckpointError> {
    let mut first_error = None;
    let mut completed = 0;
    for handle in handles {
        match handle.wait() {
            Ok(_) => completed += 1,
            Err(e) => {
                tracing::warn!(error = %e, "checkpoint write failed");
                first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(completed),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use neuroswing_network::Activation;

    use super::*;

    fn checkpoint(generation: u64) -> Checkpoint {
        Checkpoint {
            generation,
            inputs: vec!["x".to_owned(), "v".to_owned()],
            outputs: vec!["force".to_owned()],
            layers: vec![2, 3, 1],
            hidden_activation: Activation::Relu,
            output_activation: Activation::Tanh,
            uniform_activation: false,
            ticks: 3600 * generation,
            time: 0.25,
            best_score: Some(-1.5),
            saved_at: Some(Utc::now()),
            weights: vec![0.1, 0.2, 0.3, 0.4, 0.5, 0.6, -0.7, -0.8, 1.0 / 3.0],
            biases: vec![-1.0, 0.0, 1.0, 0.125],
        }
    }

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() <= 1e-12, "{a} != {e}");
        }
    }

    #[test]
    fn test_parse_generation() {
        assert_eq!(parse_generation("gen0.json"), Some(0));
        assert_eq!(parse_generation("gen42.json"), Some(42));
        assert_eq!(parse_generation("genX.json"), None);
        assert_eq!(parse_generation("gen.json"), None);
        assert_eq!(parse_generation("gen-1.json"), None);
        assert_eq!(parse_generation("gen5.json.tmp"), None);
        assert_eq!(parse_generation("notgen.txt"), None);
    }

    #[test]
    fn test_newest_generation() {
        let names = ["gen0.json", "gen5.json", "genX.json", "notgen.txt"];
        assert_eq!(newest_generation(names), Some(5));
        assert_eq!(newest_generation(["notes.md"]), None);
        assert_eq!(newest_generation(Vec::<String>::new()), None);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(CheckpointStore::file_name(17), "gen17.json");
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("gen"));
        let cp = checkpoint(4);

        let path = store.save(cp.clone()).wait().unwrap();
        assert_eq!(path, store.path(4));

        let loaded = store.load(4).unwrap().unwrap();
        assert_eq!(loaded.layers, cp.layers);
        assert_eq!(loaded.inputs, cp.inputs);
        assert_eq!(loaded.outputs, cp.outputs);
        assert_eq!(loaded.hidden_activation, cp.hidden_activation);
        assert_eq!(loaded.output_activation, cp.output_activation);
        assert_eq!(loaded.saved_at, cp.saved_at);
        assert_close(&loaded.weights, &cp.weights);
        assert_close(&loaded.biases, &cp.biases);
    }

    #[test]
    fn test_round_trip_uniform_activation() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(3);
        cp.uniform_activation = true;
        store.save_blocking(&cp).unwrap();

        let loaded = store.load(3).unwrap().unwrap();
        assert!(loaded.uniform_activation);
        assert!(loaded.activations().uniform);

        // left out of files that don't use it
        let plain = serde_json::to_string(&checkpoint(3)).unwrap();
        assert!(!plain.contains("uniform_activation"));
    }

    #[test]
    fn test_missing_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path().join("nested").join("gen"));
        assert_eq!(store.latest_generation().unwrap(), None);
        assert!(store.dir().is_dir());
        assert!(store.load_latest().unwrap().is_none());
        assert!(store.load(3).unwrap().is_none());
    }

    #[test]
    fn test_load_latest_skips_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut pending = PendingSaves::new();
        for generation in [0, 2, 9] {
            pending.push(store.save(checkpoint(generation)));
        }
        assert_eq!(pending.drain().unwrap(), 3);
        assert!(pending.is_empty());
        fs::write(dir.path().join("genX.json"), "not a checkpoint").unwrap();
        fs::write(dir.path().join("notgen.txt"), "").unwrap();

        let latest = store.load_latest().unwrap().unwrap();
        assert_eq!(latest.generation, 9);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(store.path(1), "{\"generation\": 1, \"inputs\": [").unwrap();
        let result = store.load(1);
        assert!(matches!(result, Err(CheckpointError::Parse { .. })));
    }

    #[test]
    fn test_structurally_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut cp = checkpoint(2);
        cp.biases.push(0.0);
        let json = serde_json::to_string(&cp).unwrap();
        fs::write(store.path(2), json).unwrap();
        assert!(matches!(
            store.load_latest(),
            Err(CheckpointError::Invalid { .. })
        ));
    }

    #[test]
    fn test_generation_mismatch_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let json = serde_json::to_string(&checkpoint(6)).unwrap();
        fs::write(store.path(7), json).unwrap();
        assert!(matches!(
            store.load(7),
            Err(CheckpointError::GenerationMismatch {
                expected: 7,
                found: 6,
                ..
            })
        ));
    }

    #[test]
    fn test_reap_collects_finished_saves() {
        let dir = tempfile::tempdir().unwrap();
        let store = CheckpointStore::new(dir.path());
        let mut pending = PendingSaves::new();
        pending.push(store.save(checkpoint(1)));
        pending.drain().unwrap();
        pending.push(store.save(checkpoint(2)));
        while !pending.is_empty() {
            pending.reap().unwrap();
        }
        assert_eq!(pending.in_flight(), 0);
        assert!(store.path(2).is_file());
    }
}
