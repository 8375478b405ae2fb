use super::ReadingStatus;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A chapter of a bookmarked novel, with the reader's progress.
///
/// Identified by `url` within its novel. Reading timestamps are epoch
/// milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRecord {
    pub url: String,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(default)]
    pub bookmarked: bool,
    #[serde(rename = "rS", default)]
    pub reading_status: ReadingStatus,
    #[serde(rename = "rP", default, serialize_with = "write_position", deserialize_with = "read_position")]
    pub reading_position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_reading_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_reading_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<f64>,
}

impl ChapterRecord {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            bookmarked: false,
            reading_status: ReadingStatus::Unread,
            reading_position: 0.0,
            started_reading_at: None,
            ended_reading_at: None,
            release_date: None,
            order: None,
        }
    }

    /// The sort order to insert this chapter with, falling back to its
    /// position in the archived chapter list.
    #[must_use]
    pub fn order_or(&self, index: usize) -> f64 {
        match self.order {
            Some(order) if !order.is_nan() => order,
            _ => index as f64,
        }
    }
}

/// JSON has no NaN or infinity; `serde_json` would write `null`.
fn write_position<S: Serializer>(position: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(if position.is_finite() { *position } else { 0.0 })
}

fn read_position<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.filter(|p| p.is_finite()).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(3.5), 7, 3.5)]
    #[case(None, 7, 7.0)]
    #[case(Some(f64::NAN), 2, 2.0)]
    #[case(Some(0.0), 9, 0.0)]
    fn test_order_or(#[case] order: Option<f64>, #[case] index: usize, #[case] expected: f64) {
        let mut chapter = ChapterRecord::new("/c/1", "One");
        chapter.order = order;
        assert_eq!(chapter.order_or(index), expected);
    }

    #[test]
    fn test_wire_names() {
        let chapter: ChapterRecord = serde_json::from_str(
            r#"{"url":"/c/1","name":"One","bookmarked":true,"rS":"READING","rP":0.25,"startedReadingAt":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(chapter.title, "One");
        assert_eq!(chapter.reading_status, ReadingStatus::Reading);
        assert_eq!(chapter.reading_position, 0.25);
        assert_eq!(chapter.started_reading_at, Some(1_700_000_000_000));
        assert_eq!(chapter.ended_reading_at, None);
        assert_eq!(chapter.order, None);
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn test_non_finite_position_is_written_as_zero(#[case] position: f64) {
        let mut chapter = ChapterRecord::new("/c/1", "One");
        chapter.reading_position = position;
        let json = serde_json::to_string(&chapter).unwrap();
        assert!(json.contains(r#""rP":0.0"#));
        let back: ChapterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.reading_position, 0.0);
    }

    #[test]
    fn test_null_position_is_read_as_zero() {
        let chapter: ChapterRecord = serde_json::from_str(r#"{"url":"/c/1","name":"One","rP":null}"#).unwrap();
        assert_eq!(chapter.reading_position, 0.0);
    }

    #[test]
    fn test_nan_order_is_written_as_absent() {
        let mut chapter = ChapterRecord::new("/c/1", "One");
        chapter.order = Some(f64::NAN);
        let json = serde_json::to_string(&chapter).unwrap();
        let back: ChapterRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.order, None);
    }
}
