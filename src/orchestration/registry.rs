//! # Collaborator Registry
//!
//! Maps each job type to the scraping collaborator that drives its units.
//! Built once at startup and handed to the orchestrator.

use crate::constants::JobType;
use crate::execution::ScrapingCollaborator;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone, Default)]
pub struct CollaboratorRegistry {
    collaborators: HashMap<JobType, Arc<dyn ScrapingCollaborator>>,
}

impl std::fmt::Debug for CollaboratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollaboratorRegistry")
            .field("job_types", &self.registered_types())
            .finish()
    }
}

impl CollaboratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collaborator, replacing any previous one for the job type
    pub fn register(&mut self, job_type: JobType, collaborator: Arc<dyn ScrapingCollaborator>) {
        if self.collaborators.insert(job_type, collaborator).is_some() {
            warn!(job_type = %job_type, "Replacing registered collaborator");
        } else {
            info!(job_type = %job_type, "Registered collaborator");
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, job_type: JobType, collaborator: Arc<dyn ScrapingCollaborator>) -> Self {
        self.register(job_type, collaborator);
        self
    }

    pub fn get(&self, job_type: JobType) -> Option<Arc<dyn ScrapingCollaborator>> {
        self.collaborators.get(&job_type).cloned()
    }

    pub fn contains(&self, job_type: JobType) -> bool {
        self.collaborators.contains_key(&job_type)
    }

    /// Registered job types in catalog order
    pub fn registered_types(&self) -> Vec<JobType> {
        JobType::ALL
            .into_iter()
            .filter(|job_type| self.contains(*job_type))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{ActionOutcome, CollaboratorError, FetchOutcome, WorkUnit};
    use crate::models::{Cursor, JobSettings};
    use async_trait::async_trait;

    struct Idle;

    #[async_trait]
    impl ScrapingCollaborator for Idle {
        async fn fetch_next(
            &self,
            _cursor: Option<&Cursor>,
            _settings: &JobSettings,
        ) -> Result<FetchOutcome, CollaboratorError> {
            Ok(FetchOutcome::Exhausted)
        }

        async fn apply_action(
            &self,
            _unit: &WorkUnit,
            _settings: &JobSettings,
        ) -> Result<ActionOutcome, CollaboratorError> {
            Ok(ActionOutcome::Success)
        }
    }

    #[test]
    fn test_registration() {
        let registry = CollaboratorRegistry::new()
            .with(JobType::Tracker, Arc::new(Idle))
            .with(JobType::Monitor, Arc::new(Idle));

        assert!(registry.get(JobType::Monitor).is_some());
        assert!(registry.get(JobType::AutoOrder).is_none());
        assert_eq!(
            registry.registered_types(),
            vec![JobType::Monitor, JobType::Tracker]
        );
    }
}
