/// Every submitted job gets a fresh UUID.
pub type JobId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
