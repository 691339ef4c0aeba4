use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::poller::{Poller, PollerStatus};
use crate::errors::{HeraldError, HeraldResult};

/// Named pollers plus the tasks running them.
pub struct PollerRegistry {
    pollers: BTreeMap<String, Arc<Poller>>,
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl PollerRegistry {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            pollers: BTreeMap::new(),
            shutdown,
            tasks: Vec::new(),
        }
    }

    /// Add a poller under its source name. Names and aliases must not collide.
    pub fn register(&mut self, poller: Poller) -> HeraldResult<()> {
        let source = poller.source();
        let taken = std::iter::once(&source.name)
            .chain(source.aliases.iter())
            .find(|name| self.find(name).is_some());

        if let Some(name) = taken {
            return Err(HeraldError::DuplicateSource(name.to_string()));
        }

        let name = source.name.clone();
        self.pollers.insert(name, Arc::new(poller));
        Ok(())
    }

    /// Look up a poller by source name or alias, ignoring case
    pub fn find(&self, name: &str) -> Option<&Arc<Poller>> {
        self.pollers
            .get(name)
            .or_else(|| self.pollers.values().find(|p| p.source().answers_to(name)))
    }

    pub fn len(&self) -> usize {
        self.pollers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pollers.is_empty()
    }

    /// Spawn one task per poller. Calling it again is a no-op.
    pub fn start_all(&mut self) {
        if !self.tasks.is_empty() {
            return;
        }

        for poller in self.pollers.values() {
            let task = tokio::spawn(Arc::clone(poller).run(self.shutdown.subscribe()));
            self.tasks.push(task);
        }

        tracing::info!(pollers = self.tasks.len(), "all pollers started");
    }

    /// Flip a poller's run flag. Returns the new state.
    pub fn toggle(&self, name: &str) -> HeraldResult<bool> {
        self.find(name)
            .map(|poller| poller.toggle())
            .ok_or_else(|| HeraldError::UnknownSource(name.to_string()))
    }

    /// Status of every poller, ordered by name
    pub fn status(&self) -> Vec<PollerStatus> {
        self.pollers.values().map(|p| p.status()).collect()
    }

    /// Signal every poller to stop and wait for their tasks
    pub async fn shutdown(&mut self) {
        self.shutdown.send_replace(true);

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "poller task ended abnormally");
            }
        }

        // Pollers that were never started stop here too
        for poller in self.pollers.values() {
            poller.mark_stopped();
        }

        tracing::info!("all pollers stopped");
    }
}

impl Default for PollerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceDescriptor;
    use crate::services::poller::PollerPhase;
    use crate::strategies::RssItemStrategy;
    use crate::testing::{FakeFetcher, RecordingSink};
    use std::time::Duration;

    fn poller(name: &str, app_id: u32, aliases: &[&str], fetcher: Arc<FakeFetcher>) -> Poller {
        let mut source = SourceDescriptor::new(
            name,
            &crate::strategies::steam_feed_url(app_id),
        )
        .unwrap();
        source.aliases = aliases.iter().map(|a| a.to_string()).collect();

        Poller::new(
            source,
            Arc::new(RssItemStrategy::new()),
            fetcher,
            Arc::new(RecordingSink::new()),
        )
        .unwrap()
    }

    fn registry() -> PollerRegistry {
        let mut registry = PollerRegistry::new();
        registry
            .register(poller("darkest_dungeon", 262060, &["dd"], Arc::new(FakeFetcher::new())))
            .unwrap();
        registry
    }

    #[test]
    fn test_toggle_unknown_source() {
        let err = registry().toggle("realm_royale").unwrap_err();
        assert!(matches!(err, HeraldError::UnknownSource(name) if name == "realm_royale"));
    }

    #[test]
    fn test_toggle_by_name_and_alias() {
        let registry = registry();
        assert!(!registry.toggle("darkest_dungeon").unwrap());
        assert!(registry.toggle("DD").unwrap());
        assert!(registry.status()[0].running);
    }

    #[test]
    fn test_duplicate_name_or_alias_is_rejected() {
        let mut registry = registry();

        let err = registry
            .register(poller("darkest_dungeon", 1, &[], Arc::new(FakeFetcher::new())))
            .unwrap_err();
        assert!(matches!(err, HeraldError::DuplicateSource(_)));

        let err = registry
            .register(poller("realm_royale", 813820, &["dd"], Arc::new(FakeFetcher::new())))
            .unwrap_err();
        assert!(matches!(err, HeraldError::DuplicateSource(name) if name == "dd"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_status_is_ordered_by_name() {
        let mut registry = registry();
        registry
            .register(poller("realm_royale", 813820, &["rr"], Arc::new(FakeFetcher::new())))
            .unwrap();
        registry
            .register(poller("dota2", 570, &[], Arc::new(FakeFetcher::new())))
            .unwrap();
        registry.toggle("rr").unwrap();

        let status = registry.status();
        let names: Vec<_> = status.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["darkest_dungeon", "dota2", "realm_royale"]);
        assert_eq!(
            status.iter().map(|s| s.running).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert!(status.iter().all(|s| s.phase == PollerPhase::Idle));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_all_and_shutdown() {
        let fetcher = Arc::new(FakeFetcher::new());
        let mut registry = PollerRegistry::new();
        registry
            .register(poller("darkest_dungeon", 262060, &[], fetcher.clone()))
            .unwrap();
        registry
            .register(poller("realm_royale", 813820, &[], fetcher.clone()))
            .unwrap();

        registry.start_all();
        registry.start_all();
        tokio::time::sleep(Duration::from_secs(1)).await;

        // Both sources answer 404; each poller still ran its first cycle.
        assert_eq!(fetcher.calls(), 2);
        assert!(registry
            .status()
            .iter()
            .all(|s| s.phase == PollerPhase::Running && s.last_cycle_at.is_some()));

        registry.shutdown().await;
        assert!(registry.status().iter().all(|s| s.phase == PollerPhase::Stopped));
    }

    #[tokio::test]
    async fn test_shutdown_without_start_stops_every_poller() {
        let mut registry = registry();
        assert!(registry.status().iter().all(|s| s.phase == PollerPhase::Idle));

        registry.shutdown().await;

        assert!(registry.status().iter().all(|s| s.phase == PollerPhase::Stopped));
        assert!(registry.status().iter().all(|s| s.last_cycle_at.is_none()));
    }
}
