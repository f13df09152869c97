//! # Message Catalog
//!
//! The closed, flat namespace of message names shared by every component.
//! Each name is both the wire identifier exchanged with UI contexts and the
//! name of the event a job emits. Values are equal to their symbolic names,
//! so drift between the constant and the string is visible at a glance.
//!
//! The catalog is generated from one table below: adding a job type or a
//! message kind without giving every combination a wire name fails to
//! compile, because [`MessageType::wire_name`] is an exhaustive `match`.
//!
//! Wire names are persisted alongside job snapshots and are in flight
//! between contexts during upgrades. Never rename an existing entry.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// The automation job families the orchestrator knows how to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Listing monitor: re-checks live listings for changes
    Monitor,
    /// Price/stock tracker for supplier products
    Tracker,
    /// Backfills missing SKUs on existing listings
    SkuBackfill,
    /// Imports listings from a parsed CSV file
    CsvImport,
    /// Scheduled relisting/boosting of listings
    BoostScheduler,
    /// Places supplier orders for marketplace sales
    AutoOrder,
}

impl JobType {
    /// Every job type, in scheduling order
    pub const ALL: [JobType; 6] = [
        JobType::Monitor,
        JobType::Tracker,
        JobType::SkuBackfill,
        JobType::CsvImport,
        JobType::BoostScheduler,
        JobType::AutoOrder,
    ];

    /// Stable lowercase identifier, used for persistence keys and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monitor => "monitor",
            Self::Tracker => "tracker",
            Self::SkuBackfill => "sku_backfill",
            Self::CsvImport => "csv_import",
            Self::BoostScheduler => "boost_scheduler",
            Self::AutoOrder => "auto_order",
        }
    }

    /// Prefix used by this job type's wire names (`MONITOR_PROGRESS`, ...)
    pub fn wire_prefix(&self) -> &'static str {
        match self {
            Self::Monitor => "MONITOR",
            Self::Tracker => "TRACKER",
            Self::SkuBackfill => "SKU_BACKFILL",
            Self::CsvImport => "CSV_IMPORT",
            Self::BoostScheduler => "BOOST",
            Self::AutoOrder => "AUTO_ORDER",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobType::ALL
            .into_iter()
            .find(|job_type| job_type.as_str() == s)
            .ok_or_else(|| format!("Invalid job type: {s}"))
    }
}

/// What a message asks for (control) or reports (event)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    // Control messages, UI -> orchestrator
    Start,
    Pause,
    Resume,
    Stop,
    Terminate,
    Reset,
    GetStatus,
    GetSettings,
    SaveSettings,
    GetAlerts,
    ClearAlerts,

    // Events, orchestrator -> subscribers
    Started,
    Progress,
    Alert,
    Log,
    Paused,
    Resumed,
    Complete,
    Failed,
    Cancelled,
}

/// A catalog member: one message kind addressed to one job type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    pub kind: MessageKind,
    pub job_type: JobType,
}

impl MessageType {
    pub const fn new(kind: MessageKind, job_type: JobType) -> Self {
        Self { kind, job_type }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        MessageType::from_wire(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown message type: {name}")))
    }
}

macro_rules! message_catalog {
    ($( $job:ident { $( $kind:ident => $name:ident ),* $(,)? } )*) => {
        /// Wire identifiers, one constant per catalog member
        pub mod messages {
            $( $( pub const $name: &str = stringify!($name); )* )*
        }

        /// Every catalog member paired with its wire identifier
        pub const CATALOG: &[(MessageType, &str)] = &[
            $( $( (MessageType::new(MessageKind::$kind, JobType::$job), messages::$name), )* )*
        ];

        impl MessageType {
            /// The wire identifier of this catalog member
            pub fn wire_name(&self) -> &'static str {
                match (self.kind, self.job_type) {
                    $( $( (MessageKind::$kind, JobType::$job) => messages::$name, )* )*
                }
            }

            /// Resolve a wire identifier; `None` for anything outside the catalog
            pub fn from_wire(name: &str) -> Option<Self> {
                match name {
                    $( $( messages::$name => Some(MessageType::new(MessageKind::$kind, JobType::$job)), )* )*
                    _ => None,
                }
            }
        }
    };
}

message_catalog! {
    Monitor {
        Start => START_MONITOR,
        Pause => PAUSE_MONITOR,
        Resume => RESUME_MONITOR,
        Stop => STOP_MONITOR,
        Terminate => TERMINATE_MONITOR,
        Reset => RESET_MONITOR,
        GetStatus => GET_MONITOR_STATUS,
        GetSettings => GET_MONITOR_SETTINGS,
        SaveSettings => SAVE_MONITOR_SETTINGS,
        GetAlerts => GET_MONITOR_ALERTS,
        ClearAlerts => CLEAR_MONITOR_ALERTS,
        Started => MONITOR_STARTED,
        Progress => MONITOR_PROGRESS,
        Alert => MONITOR_ALERT,
        Log => MONITOR_LOG,
        Paused => MONITOR_PAUSED,
        Resumed => MONITOR_RESUMED,
        Complete => MONITOR_COMPLETE,
        Failed => MONITOR_FAILED,
        Cancelled => MONITOR_CANCELLED,
    }
    Tracker {
        Start => START_TRACKER,
        Pause => PAUSE_TRACKER,
        Resume => RESUME_TRACKER,
        Stop => STOP_TRACKER,
        Terminate => TERMINATE_TRACKER,
        Reset => RESET_TRACKER,
        GetStatus => GET_TRACKER_STATUS,
        GetSettings => GET_TRACKER_SETTINGS,
        SaveSettings => SAVE_TRACKER_SETTINGS,
        GetAlerts => GET_TRACKER_ALERTS,
        ClearAlerts => CLEAR_TRACKER_ALERTS,
        Started => TRACKER_STARTED,
        Progress => TRACKER_PROGRESS,
        Alert => TRACKER_ALERT,
        Log => TRACKER_LOG,
        Paused => TRACKER_PAUSED,
        Resumed => TRACKER_RESUMED,
        Complete => TRACKER_COMPLETE,
        Failed => TRACKER_FAILED,
        Cancelled => TRACKER_CANCELLED,
    }
    SkuBackfill {
        Start => START_SKU_BACKFILL,
        Pause => PAUSE_SKU_BACKFILL,
        Resume => RESUME_SKU_BACKFILL,
        Stop => STOP_SKU_BACKFILL,
        Terminate => TERMINATE_SKU_BACKFILL,
        Reset => RESET_SKU_BACKFILL,
        GetStatus => GET_SKU_BACKFILL_STATUS,
        GetSettings => GET_SKU_BACKFILL_SETTINGS,
        SaveSettings => SAVE_SKU_BACKFILL_SETTINGS,
        GetAlerts => GET_SKU_BACKFILL_ALERTS,
        ClearAlerts => CLEAR_SKU_BACKFILL_ALERTS,
        Started => SKU_BACKFILL_STARTED,
        Progress => SKU_BACKFILL_PROGRESS,
        Alert => SKU_BACKFILL_ALERT,
        Log => SKU_BACKFILL_LOG,
        Paused => SKU_BACKFILL_PAUSED,
        Resumed => SKU_BACKFILL_RESUMED,
        Complete => SKU_BACKFILL_COMPLETE,
        Failed => SKU_BACKFILL_FAILED,
        Cancelled => SKU_BACKFILL_CANCELLED,
    }
    CsvImport {
        Start => START_CSV_IMPORT,
        Pause => PAUSE_CSV_IMPORT,
        Resume => RESUME_CSV_IMPORT,
        Stop => STOP_CSV_IMPORT,
        Terminate => TERMINATE_CSV_IMPORT,
        Reset => RESET_CSV_IMPORT,
        GetStatus => GET_CSV_IMPORT_STATUS,
        GetSettings => GET_CSV_IMPORT_SETTINGS,
        SaveSettings => SAVE_CSV_IMPORT_SETTINGS,
        GetAlerts => GET_CSV_IMPORT_ALERTS,
        ClearAlerts => CLEAR_CSV_IMPORT_ALERTS,
        Started => CSV_IMPORT_STARTED,
        Progress => CSV_IMPORT_PROGRESS,
        Alert => CSV_IMPORT_ALERT,
        Log => CSV_IMPORT_LOG,
        Paused => CSV_IMPORT_PAUSED,
        Resumed => CSV_IMPORT_RESUMED,
        Complete => CSV_IMPORT_COMPLETE,
        Failed => CSV_IMPORT_FAILED,
        Cancelled => CSV_IMPORT_CANCELLED,
    }
    BoostScheduler {
        Start => SCHEDULE_BOOST,
        Pause => PAUSE_BOOST,
        Resume => RESUME_BOOST,
        Stop => STOP_BOOST,
        Terminate => TERMINATE_BOOST,
        Reset => RESET_BOOST,
        GetStatus => GET_BOOST_STATUS,
        GetSettings => GET_BOOST_SETTINGS,
        SaveSettings => SAVE_BOOST_SETTINGS,
        GetAlerts => GET_BOOST_ALERTS,
        ClearAlerts => CLEAR_BOOST_ALERTS,
        Started => BOOST_STARTED,
        Progress => BOOST_PROGRESS,
        Alert => BOOST_ALERT,
        Log => BOOST_LOG,
        Paused => BOOST_PAUSED,
        Resumed => BOOST_RESUMED,
        Complete => BOOST_COMPLETE,
        Failed => BOOST_FAILED,
        Cancelled => BOOST_CANCELLED,
    }
    AutoOrder {
        Start => START_AUTO_ORDER,
        Pause => PAUSE_AUTO_ORDER,
        Resume => RESUME_AUTO_ORDER,
        Stop => STOP_AUTO_ORDER,
        Terminate => TERMINATE_AUTO_ORDER,
        Reset => RESET_AUTO_ORDER,
        GetStatus => GET_AUTO_ORDER_STATUS,
        GetSettings => GET_AUTO_ORDER_SETTINGS,
        SaveSettings => SAVE_AUTO_ORDER_SETTINGS,
        GetAlerts => GET_AUTO_ORDER_ALERTS,
        ClearAlerts => CLEAR_AUTO_ORDER_ALERTS,
        Started => AUTO_ORDER_STARTED,
        Progress => AUTO_ORDER_PROGRESS,
        Alert => AUTO_ORDER_ALERT,
        Log => AUTO_ORDER_LOG,
        Paused => AUTO_ORDER_PAUSED,
        Resumed => AUTO_ORDER_RESUMED,
        Complete => AUTO_ORDER_COMPLETE,
        Failed => AUTO_ORDER_FAILED,
        Cancelled => AUTO_ORDER_CANCELLED,
    }
}

/// Persistence namespaces owned by the orchestrator
pub mod storage {
    pub const JOB_PREFIX: &str = "job:";
    pub const SETTINGS_PREFIX: &str = "settings:";
    pub const ALERTS_PREFIX: &str = "alerts:";
}

/// Context name the orchestrator stamps on every event it broadcasts
pub const ORCHESTRATOR_ORIGIN: &str = "orchestrator";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_bijective() {
        let names: HashSet<&str> = CATALOG.iter().map(|(_, name)| *name).collect();
        let types: HashSet<MessageType> = CATALOG.iter().map(|(t, _)| *t).collect();

        assert_eq!(names.len(), CATALOG.len());
        assert_eq!(types.len(), CATALOG.len());
        assert!(names.iter().all(|name| !name.is_empty()));
    }

    #[test]
    fn test_catalog_lookup_agrees_with_table() {
        for (message_type, name) in CATALOG {
            assert_eq!(message_type.wire_name(), *name);
            assert_eq!(MessageType::from_wire(name), Some(*message_type));
        }
        assert_eq!(MessageType::from_wire("START_EVERYTHING"), None);
        assert_eq!(MessageType::from_wire(""), None);
    }

    #[test]
    fn test_known_wire_names() {
        assert_eq!(messages::START_SKU_BACKFILL, "START_SKU_BACKFILL");
        assert_eq!(messages::SCHEDULE_BOOST, "SCHEDULE_BOOST");
        assert_eq!(
            MessageType::new(MessageKind::Progress, JobType::CsvImport).wire_name(),
            "CSV_IMPORT_PROGRESS"
        );
    }

    #[test]
    fn test_job_type_string_conversion() {
        for job_type in JobType::ALL {
            assert_eq!(job_type.as_str().parse::<JobType>().unwrap(), job_type);
        }
        assert!("invalid_job".parse::<JobType>().is_err());

        let json = serde_json::to_string(&JobType::SkuBackfill).unwrap();
        assert_eq!(json, "\"sku_backfill\"");
    }

    #[test]
    fn test_message_type_serde_uses_wire_name() {
        let message_type = MessageType::new(MessageKind::Pause, JobType::Monitor);
        let json = serde_json::to_string(&message_type).unwrap();
        assert_eq!(json, "\"PAUSE_MONITOR\"");

        let parsed: MessageType = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message_type);
        assert!(serde_json::from_str::<MessageType>("\"NOT_A_MESSAGE\"").is_err());
    }
}
