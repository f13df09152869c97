use crate::constants::JobType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one connected listener context (a UI page, the badge updater)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// What a listener wants to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Every job type
    All,
    Job(JobType),
}

impl Topic {
    pub fn matches(&self, job_type: JobType) -> bool {
        match self {
            Self::All => true,
            Self::Job(subscribed) => *subscribed == job_type,
        }
    }
}

/// A (listener, topic) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscription {
    pub listener: ListenerId,
    pub topic: Topic,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_matching() {
        assert!(Topic::All.matches(JobType::AutoOrder));
        assert!(Topic::Job(JobType::Tracker).matches(JobType::Tracker));
        assert!(!Topic::Job(JobType::Tracker).matches(JobType::Monitor));
    }
}
