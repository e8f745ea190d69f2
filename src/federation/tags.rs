use chrono::NaiveDate;
use exposure_types::BatchTag;
use uuid::Uuid;

/// Source of batch tags for outgoing uploads
pub trait BatchTagSource: Send + Sync {
    fn next_tag(&self, date: NaiveDate) -> BatchTag;
}

/// Tags of the form `20261019-<uuid>`, unique per upload
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidBatchTagSource;

impl BatchTagSource for UuidBatchTagSource {
    fn next_tag(&self, date: NaiveDate) -> BatchTag {
        BatchTag::new(format!(
            "{}-{}",
            date.format("%Y%m%d"),
            Uuid::new_v4().simple()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_are_unique_and_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let first = UuidBatchTagSource.next_tag(date);
        let second = UuidBatchTagSource.next_tag(date);

        assert_ne!(first, second);
        assert!(first.as_str().starts_with("20261018-"));
    }
}
