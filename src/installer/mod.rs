//! Unit installation
//!
//! This module handles:
//! - Installing plain archives straight from their location
//! - Installing packed archives (`.jar.pack.gz`) by decompressing them on a
//!   producer thread and streaming the result into the registry
//!
//! ```text
//! source ──► gunzip ──► Unpacker ──► PipeWriter ══ bounded ══► PipeReader ──► registry.install
//!            └──────────── producer thread ─────────┘                        └─ caller ─┘
//! ```

pub mod pipe;
pub mod unpack;

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

use crate::error::{self, DeployError, Result};
use crate::location;
use crate::registry::{Unit, UnitRegistry};
use crate::source::ArtifactSource;

use pipe::PipeWriter;
use unpack::{PlainUnpacker, Unpacker};

/// Installs units, unpacking packed archives on the fly
#[derive(Clone)]
pub struct ArchiveInstaller {
    source: Arc<dyn ArtifactSource>,
    unpacker: Arc<dyn Unpacker>,
    pipe_capacity: usize,
}

impl ArchiveInstaller {
    pub fn new(source: Arc<dyn ArtifactSource>) -> Self {
        Self {
            source,
            unpacker: Arc::new(PlainUnpacker),
            pipe_capacity: pipe::DEFAULT_CAPACITY,
        }
    }

    /// Use a different unpacker for packed archives
    #[allow(dead_code)] // used in tests
    #[must_use]
    pub fn with_unpacker(mut self, unpacker: Arc<dyn Unpacker>) -> Self {
        self.unpacker = unpacker;
        self
    }

    /// Number of chunks the pipe buffers before the producer blocks
    #[allow(dead_code)] // used in tests
    #[must_use]
    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    /// Install the unit at `location`.
    ///
    /// A packed location whose plain counterpart is already installed is
    /// satisfied by that unit without fetching anything.
    pub fn install(&self, registry: &mut dyn UnitRegistry, location: &str) -> Result<Unit> {
        if !location::is_packed(location) {
            return registry.install(location, None);
        }

        let plain = location::unpacked_location(location);
        if registry.unit_by_location(plain).is_some() {
            debug!("{} already installed, skipping packed download", plain);
            return registry.install(plain, None);
        }

        let (writer, mut reader) = pipe::pipe(self.pipe_capacity);
        let producer = self.spawn_producer(location.to_string(), writer)?;

        let result = registry.install(plain, Some(&mut reader));
        // unblock the producer if the registry stopped reading early
        drop(reader);

        if producer.join().is_err() {
            warn!("Unpack thread for {} panicked", location);
        }
        result
    }

    fn spawn_producer(&self, packed: String, writer: PipeWriter) -> Result<JoinHandle<()>> {
        let source = Arc::clone(&self.source);
        let unpacker = Arc::clone(&self.unpacker);

        thread::Builder::new()
            .name("unpack".to_string())
            .spawn(move || produce(source.as_ref(), unpacker.as_ref(), &packed, writer))
            .map_err(DeployError::from)
    }
}

/// Producer side of a packed install: fetch, gunzip, unpack into the pipe
fn produce(
    source: &dyn ArtifactSource,
    unpacker: &dyn Unpacker,
    packed: &str,
    mut writer: PipeWriter,
) {
    let outcome = source.open(packed).and_then(|input| {
        unpack::unpack_packed(input, unpacker, &mut writer)
            .map_err(|e| error::fetch::fetch_failed(packed, "cannot unpack archive", e))
    });

    match outcome {
        Ok(bytes) => debug!("unpacked {} ({} bytes)", packed, bytes),
        Err(e) => {
            error!("Cannot unpack {}: {}", packed, error::cause_chain(&e));
            writer.fail(io::Error::other(error::fetch::stream_failed(e.to_string())));
        }
    }
}
