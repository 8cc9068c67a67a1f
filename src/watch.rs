//! Watches the project sources and rebuilds the site when they change.
//!
//! Events are batched: a rebuild starts once no new event has arrived for
//! [`DEBOUNCE_MS`] milliseconds, so saving several files at once rebuilds
//! once. Rebuilds run one at a time on the watching thread. A failed rebuild
//! is logged and watching continues.

use crate::build::build_site;
use crate::config::Config;
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

pub const DEBOUNCE_MS: u64 = 300;

/// Editor artifacts: swap and backup files and dotfiles.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

/// Collects changed paths until the burst of events settles.
struct Debouncer {
    pending: HashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: HashSet::new(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .map_or(false, |t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        match self.pending.is_empty() {
            true => Duration::from_secs(60),
            false => Duration::from_millis(DEBOUNCE_MS),
        }
    }
}

/// The paths a change to which triggers a rebuild, paired with whether they
/// are watched recursively. Paths that don't exist are left out.
fn watched_paths(config: &Config) -> Vec<(&Path, RecursiveMode)> {
    [
        (config.posts_source_directory.as_path(), RecursiveMode::Recursive),
        (config.pages_source_directory.as_path(), RecursiveMode::Recursive),
        (config.theme_directory.as_path(), RecursiveMode::Recursive),
        (config.project_file.as_path(), RecursiveMode::NonRecursive),
    ]
    .into_iter()
    .filter(|(path, _)| path.exists())
    .collect()
}

// Rebuilds after a batch of changes. The project file is re-read when it is
// among them; if it no longer loads, the previous configuration is kept.
fn rebuild(config: &mut Config, changed: &[PathBuf]) {
    for path in changed {
        tracing::debug!(path = %path.display(), "changed");
    }
    if changed
        .iter()
        .any(|p| p.file_name() == config.project_file.file_name())
    {
        match Config::from_project_file(&config.project_file, Some(&config.output_directory)) {
            Ok(reloaded) => *config = reloaded,
            Err(e) => tracing::error!("reloading configuration: {:#}", e),
        }
    }
    tracing::info!("{} file(s) changed, rebuilding", changed.len());
    if let Err(e) = build_site(config) {
        tracing::error!("build failed: {}", e);
    }
}

/// Builds the site, then blocks, rebuilding whenever a watched path changes.
/// Returns only if the watcher can't be set up or its channel closes.
pub fn watch(mut config: Config) -> Result<()> {
    if let Err(e) = build_site(&config) {
        tracing::error!("build failed: {}", e);
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    for (path, mode) in watched_paths(&config) {
        watcher
            .watch(path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;
        tracing::info!("watching {}", path.display());
    }

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => tracing::warn!("watch error: {}", e),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                rebuild(&mut config, &debouncer.take());
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use notify::event::{CreateKind, ModifyKind};

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("posts/hello.md.swp")));
        assert!(is_temp_file(Path::new("posts/hello.md~")));
        assert!(is_temp_file(Path::new("posts/.hello.md")));
        assert!(is_temp_file(Path::new("posts/hello.bak")));
        assert!(!is_temp_file(Path::new("posts/hello.md")));
        assert!(!is_temp_file(Path::new("paper.yaml")));
    }

    #[test]
    fn test_debouncer() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("posts/a.md"))
            .add_path(PathBuf::from("posts/.a.md.swp"));
        assert!(is_relevant(&event));
        debouncer.add(event);
        debouncer.add(
            Event::new(EventKind::Modify(ModifyKind::Any)).add_path(PathBuf::from("posts/a.md")),
        );
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));

        debouncer.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS));
        assert!(debouncer.ready());
        assert_eq!(debouncer.take(), vec![PathBuf::from("posts/a.md")]);
        assert!(!debouncer.ready());
    }

    #[test]
    fn test_access_events_are_ignored() {
        let event = Event::new(EventKind::Access(notify::event::AccessKind::Any));
        assert!(!is_relevant(&event));
    }
}
