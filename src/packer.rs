/// Background packing jobs
///
/// A job enumerates the source directory, plans the image and writes it on
/// its own thread. Callers poll a [`SharedProgress`] record meanwhile; a
/// failure only ever shows up as the `Failed` state and the error returned
/// from [`PackingJob::wait`].

use crate::error::{DiscError, Result};
use crate::format::VolumeSpec;
use crate::image::DiscImage;
use crate::progress::{Progress, ProgressSink, ProgressState, SharedProgress};
use crate::tree::FileTree;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Progress published once the source tree is enumerated
pub const ENUMERATED_PROGRESS: f32 = 0.01;

/// Starts packing jobs
pub struct Packer;

impl Packer {
    /// Start packing `source` into the image file `dest`
    pub fn start<S: Into<PathBuf>, D: Into<PathBuf>>(
        source: S,
        dest: D,
        spec: VolumeSpec,
    ) -> Result<PackingJob> {
        let source = source.into();
        let dest = dest.into();
        let progress = SharedProgress::new();
        let sink = progress.clone();

        let handle = thread::Builder::new()
            .name("ps2img-pack".to_string())
            .spawn(move || {
                let result = pack(&source, &dest, spec, &sink);
                if let Err(e) = &result {
                    log::error!("Packing {} failed: {}", source.display(), e);
                    sink.update(ProgressState::Failed, 0.0, None);
                }
                result
            })?;

        Ok(PackingJob {
            handle: Some(handle),
            progress,
        })
    }

    /// Pack on the calling thread
    pub fn run<S: AsRef<Path>, D: AsRef<Path>>(
        source: S,
        dest: D,
        spec: VolumeSpec,
        sink: &dyn ProgressSink,
    ) -> Result<()> {
        let result = pack(source.as_ref(), dest.as_ref(), spec, sink);
        if result.is_err() {
            sink.update(ProgressState::Failed, 0.0, None);
        }
        result
    }
}

fn pack(source: &Path, dest: &Path, spec: VolumeSpec, sink: &dyn ProgressSink) -> Result<()> {
    let tree = FileTree::from_directory(source)?;
    sink.update(ProgressState::Enumerating, ENUMERATED_PROGRESS, None);
    let image = DiscImage::create(tree, spec)?;
    image.save(dest, sink)
}

/// A running packing job
pub struct PackingJob {
    handle: Option<JoinHandle<Result<()>>>,
    progress: SharedProgress,
}

impl PackingJob {
    /// Copy the progress record and clear its change flags
    pub fn poll(&self) -> Progress {
        self.progress.poll()
    }

    /// Copy the progress record without clearing its change flags
    pub fn snapshot(&self) -> Progress {
        self.progress.snapshot()
    }

    /// Shared progress record, for pollers on other threads
    pub fn progress(&self) -> SharedProgress {
        self.progress.clone()
    }

    /// Check whether the job has succeeded or failed
    pub fn is_finished(&self) -> bool {
        self.progress.snapshot().finished
    }

    /// Wait for the job and return its outcome
    pub fn wait(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(_) => {
                    self.progress.update(ProgressState::Failed, 0.0, None);
                    Err(DiscError::Io(std::io::Error::other(
                        "packing thread panicked",
                    )))
                }
            },
            None => Ok(()),
        }
    }
}
