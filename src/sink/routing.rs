//! Level-based routing across several sinks
//!
//! Each level maps to a destination. Levels that name the same destination
//! share one underlying sink, so there is a single file handle (and a single
//! rotation counter) per physical file. Events without a level, or with a
//! level that has no route, go to the default sink.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{FileSink, RollingSink, RotationPolicy, Sink, SinkResult};
use crate::event::{Level, LogEvent, RenderMode};
use crate::utils::Zone;

/// Where a level's events go
#[derive(Clone)]
pub enum Destination {
    /// A file path; the builder constructs the sink
    Path(PathBuf),
    /// An already built sink
    Sink(Arc<dyn Sink>),
}

impl From<&str> for Destination {
    fn from(path: &str) -> Self {
        Destination::Path(PathBuf::from(path))
    }
}

impl From<String> for Destination {
    fn from(path: String) -> Self {
        Destination::Path(PathBuf::from(path))
    }
}

impl From<&Path> for Destination {
    fn from(path: &Path) -> Self {
        Destination::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Destination {
    fn from(path: PathBuf) -> Self {
        Destination::Path(path)
    }
}

impl From<Arc<dyn Sink>> for Destination {
    fn from(sink: Arc<dyn Sink>) -> Self {
        Destination::Sink(sink)
    }
}

impl std::fmt::Debug for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Destination::Sink(sink) => f.debug_tuple("Sink").field(&Arc::as_ptr(sink)).finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DestinationKey {
    Path(PathBuf),
    Sink(usize),
}

impl Destination {
    fn key(&self) -> DestinationKey {
        match self {
            Destination::Path(path) => DestinationKey::Path(normalize(path)),
            Destination::Sink(sink) => DestinationKey::Sink(Arc::as_ptr(sink) as *const () as usize),
        }
    }
}

/// Absolute, lexically folded form of `path`
///
/// `logs/a.log`, `./logs/x/../a.log` and `<cwd>/logs/a.log` all map to one
/// key. Symlinks are not resolved.
fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                folded.pop();
            }
            other => folded.push(other),
        }
    }
    folded
}

/// Collects routes, then builds a [`RoutingSink`]
#[derive(Debug)]
pub struct RoutingBuilder {
    routes: Vec<(Level, Destination)>,
    default: Destination,
}

impl RoutingBuilder {
    /// Start with the destination for unleveled and unrouted events
    pub fn new(default: impl Into<Destination>) -> Self {
        Self {
            routes: Vec::new(),
            default: default.into(),
        }
    }

    /// Send `level` to `destination`; a later route for the same level wins
    pub fn route(mut self, level: Level, destination: impl Into<Destination>) -> Self {
        let destination = destination.into();
        match self.routes.iter_mut().find(|(l, _)| *l == level) {
            Some(slot) => slot.1 = destination,
            None => self.routes.push((level, destination)),
        }
        self
    }

    /// Add several routes at once
    pub fn routes<I, D>(self, routes: I) -> Self
    where
        I: IntoIterator<Item = (Level, D)>,
        D: Into<Destination>,
    {
        routes
            .into_iter()
            .fold(self, |builder, (level, destination)| builder.route(level, destination))
    }

    /// Build with plain [`FileSink`]s for path destinations
    pub fn build(self) -> SinkResult<RoutingSink> {
        self.build_with(|path| Ok(Arc::new(FileSink::open(path)?) as Arc<dyn Sink>))
    }

    /// Build with a [`RollingSink`] per distinct path destination
    pub fn build_rolling(self, policy: RotationPolicy, zone: Zone) -> SinkResult<RoutingSink> {
        self.build_with(|path| Ok(Arc::new(RollingSink::with_zone(path, policy, zone)?) as Arc<dyn Sink>))
    }

    /// Build, calling `make` once per distinct path destination
    ///
    /// If any sink fails to build, the sinks already built from paths are
    /// closed and the error is returned.
    pub fn build_with<F>(self, mut make: F) -> SinkResult<RoutingSink>
    where
        F: FnMut(&Path) -> SinkResult<Arc<dyn Sink>>,
    {
        let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
        let mut owned: Vec<bool> = Vec::new();
        let mut by_key: HashMap<DestinationKey, usize> = HashMap::new();

        let mut resolve = |destination: Destination| -> SinkResult<usize> {
            let key = destination.key();
            if let Some(&index) = by_key.get(&key) {
                return Ok(index);
            }

            let (sink, built_here) = match destination {
                Destination::Path(path) => (make(&path)?, true),
                Destination::Sink(sink) => (sink, false),
            };
            sinks.push(sink);
            owned.push(built_here);
            by_key.insert(key, sinks.len() - 1);
            Ok(sinks.len() - 1)
        };

        let mut routes = HashMap::new();
        let mut failure = None;
        for (level, destination) in self.routes {
            match resolve(destination) {
                Ok(index) => {
                    routes.insert(level, index);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        let default = match failure {
            None => resolve(self.default),
            Some(e) => Err(e),
        };
        drop(resolve);

        let default = match default {
            Ok(index) => index,
            Err(e) => {
                for (sink, built_here) in sinks.iter().zip(&owned) {
                    if *built_here {
                        sink.close();
                    }
                }
                return Err(e);
            }
        };

        Ok(RoutingSink {
            routes,
            sinks,
            default,
            closed: AtomicBool::new(false),
        })
    }
}

/// Routes each event to a sink chosen by its level
pub struct RoutingSink {
    routes: HashMap<Level, usize>,
    sinks: Vec<Arc<dyn Sink>>,
    default: usize,
    closed: AtomicBool,
}

impl RoutingSink {
    pub fn builder(default: impl Into<Destination>) -> RoutingBuilder {
        RoutingBuilder::new(default)
    }

    /// Number of distinct underlying sinks, the default included
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Number of distinct sinks reachable through level routes alone
    pub fn route_sink_count(&self) -> usize {
        let mut indices: Vec<usize> = self.routes.values().copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices.len()
    }

    /// The sink an event with `level` goes to
    pub fn sink_for(&self, level: Option<&Level>) -> &Arc<dyn Sink> {
        let index = level
            .and_then(|level| self.routes.get(level))
            .copied()
            .unwrap_or(self.default);
        &self.sinks[index]
    }

    /// Whether `level` has a route of its own
    pub fn is_routed(&self, level: &Level) -> bool {
        self.routes.contains_key(level)
    }
}

impl Sink for RoutingSink {
    fn write(&self, event: &LogEvent, mode: RenderMode) -> SinkResult<()> {
        self.sink_for(event.level()).write(event, mode)
    }

    /// Close each distinct sink exactly once
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for sink in &self.sinks {
            sink.close();
        }
    }
}
