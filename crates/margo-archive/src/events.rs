/// Notification emitted by the store after every successful mutating
/// write. Subscribers re-derive their view from [`crate::store::ArchiveStore::load`]
/// instead of polling a shared refresh flag.
#[derive(Debug, Clone)]
pub enum ArchiveEvent {
    Changed { file_name: String },
}
