/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Identifier assigned to each accepted generation request.
pub type RequestId = uuid::Uuid;
