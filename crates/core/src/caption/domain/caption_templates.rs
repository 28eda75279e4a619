use serde::{Deserialize, Serialize};

pub const NAME_PLACEHOLDER: &str = "{name}";
pub const COUNT_PLACEHOLDER: &str = "{count}";

/// Template bucket a caption is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionBucket {
    KnownPerson,
    Happy,
    Surprised,
    Neutral,
    Unknown,
    Group,
}

impl CaptionBucket {
    /// Expression bucket: "smile" → happy, "surprised" → surprised, anything
    /// else → neutral. Matching is a case-insensitive substring test.
    pub fn for_expression(expression: &str) -> CaptionBucket {
        let lower = expression.to_lowercase();
        if lower.contains("smile") {
            CaptionBucket::Happy
        } else if lower.contains("surprised") {
            CaptionBucket::Surprised
        } else {
            CaptionBucket::Neutral
        }
    }
}

/// Caption templates per bucket. Replaceable so hosts can localize or
/// restyle captions without touching the synthesizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSet {
    pub known_person: Vec<String>,
    pub happy: Vec<String>,
    pub surprised: Vec<String>,
    pub neutral: Vec<String>,
    pub unknown: Vec<String>,
    pub group: Vec<String>,
}

impl TemplateSet {
    pub fn templates(&self, bucket: CaptionBucket) -> &[String] {
        match bucket {
            CaptionBucket::KnownPerson => &self.known_person,
            CaptionBucket::Happy => &self.happy,
            CaptionBucket::Surprised => &self.surprised,
            CaptionBucket::Neutral => &self.neutral,
            CaptionBucket::Unknown => &self.unknown,
            CaptionBucket::Group => &self.group,
        }
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            known_person: owned(&["This is {name}", "{name} is here", "Hello, {name}!"]),
            happy: owned(&[
                "Someone is smiling",
                "A happy face",
                "Looking cheerful today",
            ]),
            surprised: owned(&[
                "Someone looks surprised",
                "A surprised face",
                "What a surprise!",
            ]),
            neutral: owned(&[
                "A calm face",
                "Someone is looking this way",
                "A thoughtful expression",
            ]),
            unknown: owned(&["Unknown person", "Someone is here", "A face in view"]),
            group: owned(&[
                "{count} people in view",
                "A group of {count}",
                "{count} faces detected",
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("smile", CaptionBucket::Happy)]
    #[case("big smile", CaptionBucket::Happy)]
    #[case("Smiley", CaptionBucket::Happy)]
    #[case("surprised", CaptionBucket::Surprised)]
    #[case("very SURPRISED", CaptionBucket::Surprised)]
    #[case("frown", CaptionBucket::Neutral)]
    #[case("", CaptionBucket::Neutral)]
    fn test_expression_bucket(#[case] expression: &str, #[case] expected: CaptionBucket) {
        assert_eq!(CaptionBucket::for_expression(expression), expected);
    }

    #[test]
    fn test_default_buckets_are_populated() {
        let set = TemplateSet::default();
        for bucket in [
            CaptionBucket::KnownPerson,
            CaptionBucket::Happy,
            CaptionBucket::Surprised,
            CaptionBucket::Neutral,
            CaptionBucket::Unknown,
            CaptionBucket::Group,
        ] {
            assert!(!set.templates(bucket).is_empty(), "{bucket:?} is empty");
        }
    }

    #[test]
    fn test_placeholders_present() {
        let set = TemplateSet::default();
        assert!(set.known_person.iter().all(|t| t.contains(NAME_PLACEHOLDER)));
        assert!(set.group.iter().all(|t| t.contains(COUNT_PLACEHOLDER)));
    }
}
