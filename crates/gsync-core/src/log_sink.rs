use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{Receiver, Sender};
use fs2::FileExt;
use log::warn;

/// Append-only text log backed by a file, mirrored in memory.
///
/// Each append holds the in-process lock and an exclusive advisory lock on the
/// file for the whole write, so concurrent writers never split a chunk. The
/// file is only ever truncated by [`LogSink::clear`].
#[derive(Debug)]
pub struct LogSink {
    path: PathBuf,
    state: Mutex<SinkState>,
}

#[derive(Debug, Default)]
struct SinkState {
    mirror: String,
    subscribers: Vec<Sender<String>>,
}

impl LogSink {
    /// A sink with an empty mirror. Nothing touches disk until the first append.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(SinkState::default()),
        }
    }

    /// A sink whose mirror starts with what is already on disk.
    ///
    /// # Errors
    /// Returns the I/O error if an existing file cannot be read.
    pub fn open(path: PathBuf) -> io::Result<Self> {
        let sink = Self::new(path);
        sink.load_existing()?;
        Ok(sink)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `text` to the file and the mirror, then fan it out.
    ///
    /// The mirror and subscribers see the chunk even when the file write
    /// fails.
    ///
    /// # Errors
    /// Returns the I/O error from opening, locking, or writing the file.
    pub fn append(&self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let mut state = self.lock_state();
        let written = append_locked(&self.path, text);
        if let Err(error) = &written {
            warn!("Failed to append to {}: {error}", self.path.display());
        }

        state.mirror.push_str(text);
        state
            .subscribers
            .retain(|subscriber| subscriber.send(text.to_string()).is_ok());

        written
    }

    /// Receive every chunk appended after this call.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<String> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.lock_state().subscribers.push(sender);
        receiver
    }

    /// Snapshot of the in-memory mirror.
    #[must_use]
    pub fn contents(&self) -> String {
        self.lock_state().mirror.clone()
    }

    /// Truncate the file and empty the mirror.
    ///
    /// # Errors
    /// Returns the I/O error if the file cannot be truncated.
    pub fn clear(&self) -> io::Result<()> {
        let mut state = self.lock_state();
        if self.path.exists() {
            let file = OpenOptions::new().write(true).open(&self.path)?;
            file.lock_exclusive()?;
            file.set_len(0)?;
        }
        state.mirror.clear();
        Ok(())
    }

    /// Replace the mirror with the file's current contents.
    ///
    /// A missing file counts as empty. Invalid UTF-8 is replaced lossily.
    ///
    /// # Errors
    /// Returns any I/O error other than the file not existing.
    pub fn load_existing(&self) -> io::Result<()> {
        let contents = match std::fs::read(&self.path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(error) if error.kind() == io::ErrorKind::NotFound => String::new(),
            Err(error) => return Err(error),
        };
        self.lock_state().mirror = contents;
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn append_locked(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;
    file.write_all(text.as_bytes())?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::LogSink;

    #[test]
    fn appends_reach_file_and_mirror_in_order() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("nested/export.log");
        let sink = LogSink::new(path.clone());

        sink.append("first\n").expect("append should succeed");
        sink.append("second\n").expect("append should succeed");

        assert_eq!(
            std::fs::read_to_string(&path).expect("log should be readable"),
            "first\nsecond\n"
        );
        assert_eq!(sink.contents(), "first\nsecond\n");
    }

    #[test]
    fn never_truncates_existing_content_on_open() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("export.log");
        std::fs::write(&path, "from the scheduled run\n").expect("seed log should be written");

        let sink = LogSink::open(path.clone()).expect("sink should open");
        sink.append("from the app\n").expect("append should succeed");

        assert_eq!(
            std::fs::read_to_string(&path).expect("log should be readable"),
            "from the scheduled run\nfrom the app\n"
        );
        assert_eq!(sink.contents(), "from the scheduled run\nfrom the app\n");
    }

    #[test]
    fn clear_truncates_file_and_mirror() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("export.log");
        let sink = LogSink::new(path.clone());
        sink.append("old\n").expect("append should succeed");

        sink.clear().expect("clear should succeed");
        sink.append("new\n").expect("append should succeed");

        assert_eq!(
            std::fs::read_to_string(&path).expect("log should be readable"),
            "new\n"
        );
        assert_eq!(sink.contents(), "new\n");
    }

    #[test]
    fn subscribers_receive_chunks_and_dead_ones_are_pruned() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let sink = LogSink::new(temp.path().join("export.log"));
        let live = sink.subscribe();
        let dropped = sink.subscribe();
        drop(dropped);

        sink.append("chunk\n").expect("append should succeed");

        assert_eq!(live.try_recv().as_deref(), Ok("chunk\n"));
        assert_eq!(sink.state.lock().expect("state lock").subscribers.len(), 1);
    }

    #[test]
    fn concurrent_appends_never_interleave_within_a_chunk() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let path = temp.path().join("export.log");
        let sink = Arc::new(LogSink::new(path.clone()));

        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for line in 0..50 {
                        sink.append(&format!("worker-{worker} line-{line} end\n"))
                            .expect("append should succeed");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker should finish");
        }

        let contents = std::fs::read_to_string(&path).expect("log should be readable");
        assert_eq!(contents.lines().count(), 200);
        assert!(
            contents
                .lines()
                .all(|line| line.starts_with("worker-") && line.ends_with(" end"))
        );
    }

    #[test]
    fn append_failure_still_updates_mirror() {
        let temp = tempfile::tempdir().expect("tempdir should be created");
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "").expect("blocker file should be written");
        let sink = LogSink::new(blocker.join("export.log"));

        assert!(sink.append("kept in memory\n").is_err());
        assert_eq!(sink.contents(), "kept in memory\n");
    }
}
