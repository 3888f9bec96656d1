use crate::error::StoryError;
use std::fs;
use std::path::PathBuf;

/// Best-completed-level file: a single integer on disk.
///
/// Unreadable or corrupt content degrades to 0 with a warning; the file
/// is rewritten only when a new level exceeds the stored one.
pub struct ScoreStore {
    path: PathBuf,
    best: u32,
}

impl ScoreStore {
    /// Open the store, reading the current best if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let best = match fs::read_to_string(&path) {
            Ok(text) => match text.trim().parse::<u32>() {
                Ok(value) => value,
                Err(_) => {
                    log::warn!("progress file {} is corrupt, starting from 0", path.display());
                    0
                }
            },
            Err(_) => 0,
        };
        Self { path, best }
    }

    /// The best level completed so far.
    pub fn best(&self) -> u32 {
        self.best
    }

    /// Record a completed level, persisting only improvements.
    pub fn record(&mut self, level: u32) -> Result<(), StoryError> {
        if level > self.best {
            self.best = level;
            fs::write(&self.path, self.best.to_string())?;
        }
        Ok(())
    }
}
