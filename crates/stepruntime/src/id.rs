use stepcore::ExecutionId;
use uuid::Uuid;

/// Generate a fresh execution id.
///
/// UUIDv7 puts the millisecond timestamp in the high bits and fills the rest
/// with random data, so ids minted in the same millisecond still differ.
pub fn next_execution_id() -> ExecutionId {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn unique_within_a_burst() {
        let ids: Vec<_> = (0..10_000).map(|_| next_execution_id()).collect();
        let distinct: HashSet<_> = ids.iter().collect();
        assert_eq!(distinct.len(), ids.len());
        assert!(ids.iter().all(|id| id.get_version_num() == 7));
    }

    #[test]
    fn ordered_across_milliseconds() {
        let first = next_execution_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = next_execution_id();
        assert!(first < second);
    }
}
