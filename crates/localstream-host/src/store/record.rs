/// One persisted row, keyed by the originator identifier.
///
/// Records are always written whole: storing a record whose identifier is
/// already present replaces every column of the previous row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub originator_id: String,
    /// ISO-8601 time the item was observed.
    pub timestamp: String,
    /// Source tag such as `Home` or `Bookmarks`.
    pub record_type: String,
    /// Serialized JSON payload, or `""` when none was supplied.
    pub data: String,
    pub user_id: String,
    /// Tri-state eligibility flag; `None` is stored as NULL.
    pub can_send_to_ca: Option<bool>,
    /// Never `Some("")`; empty reasons are normalised to `None`.
    pub reason: Option<String>,
    /// ISO-8601 time the parent queued the record.
    pub date_added: String,
}
