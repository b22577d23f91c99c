/// One scanned row reduced to what the statistics need.
///
/// Instances are consumed as soon as they are produced; nothing keeps them
/// around after the accumulator has seen them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowObservation {
    pub key: i64,
    /// Payload length in bytes, `None` when the payload column is null.
    pub payload_len: Option<u64>,
}

impl RowObservation {
    pub const fn new(key: i64, payload_len: Option<u64>) -> Self {
        Self { key, payload_len }
    }

    pub const fn null_payload(key: i64) -> Self {
        Self { key, payload_len: None }
    }
}
