use super::ReadingStatus;
use shelf_archive::models::ChapterRecord;

#[derive(Clone, Debug, PartialEq)]
pub struct Chapter {
    pub id: i64,
    pub novel_id: i64,
    pub extension_id: i64,
    pub url: String,
    pub title: String,
    pub release_date: Option<String>,
    pub order: f64,
    pub reading_position: f64,
    pub reading_status: ReadingStatus,
    pub bookmarked: bool,
}

impl Chapter {
    /// Apply the user state carried by an archived record.
    ///
    /// Title and bookmark always come from the record. Reading status and
    /// position only do while the chapter is still unread here: progress
    /// made on this device is never rolled back.
    pub fn apply_record(&mut self, record: &ChapterRecord) {
        self.title.clone_from(&record.title);
        self.bookmarked = record.bookmarked;
        if !self.reading_status.is_started() {
            self.reading_status = record.reading_status;
            self.reading_position = record.reading_position;
        }
    }
}

/// A chapter that has not been written to a store yet. Reading state starts
/// out empty.
#[derive(Clone, Debug, PartialEq)]
pub struct NewChapter {
    pub novel_id: i64,
    pub extension_id: i64,
    pub url: String,
    pub title: String,
    pub release_date: Option<String>,
    pub order: f64,
}

impl NewChapter {
    /// `index` is the record's position in its archived chapter list, used
    /// when the record carries no usable order.
    pub fn from_record(novel_id: i64, extension_id: i64, index: usize, record: &ChapterRecord) -> Self {
        Self {
            novel_id,
            extension_id,
            url: record.url.clone(),
            title: record.title.clone(),
            release_date: record.release_date.clone(),
            order: record.order_or(index),
        }
    }
}

/// When a chapter was started and finished, in epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChapterHistory {
    pub chapter_id: i64,
    pub novel_id: i64,
    pub started_reading_at: i64,
    pub ended_reading_at: Option<i64>,
}

impl ChapterHistory {
    /// Merge an archived record into the chapter's current history.
    ///
    /// Returns `None` when the record has nothing to contribute (no start
    /// time). An end time is only taken together with a start time, and an
    /// existing end time is kept when the record has none.
    pub fn merged(current: Option<&ChapterHistory>, chapter: &Chapter, record: &ChapterRecord) -> Option<Self> {
        let started = record.started_reading_at?;
        let mut history = current.cloned().unwrap_or(Self {
            chapter_id: chapter.id,
            novel_id: chapter.novel_id,
            started_reading_at: started,
            ended_reading_at: None,
        });
        history.started_reading_at = started;
        if let Some(ended) = record.ended_reading_at {
            history.ended_reading_at = Some(ended);
        }
        Some(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn chapter(status: ReadingStatus, position: f64) -> Chapter {
        Chapter {
            id: 10,
            novel_id: 1,
            extension_id: 7,
            url: "/c/1".to_string(),
            title: "Local Title".to_string(),
            release_date: None,
            order: 0.0,
            reading_position: position,
            reading_status: status,
            bookmarked: false,
        }
    }

    fn record(status: ReadingStatus, position: f64) -> ChapterRecord {
        let mut record = ChapterRecord::new("/c/1", "Archived Title");
        record.bookmarked = true;
        record.reading_status = status;
        record.reading_position = position;
        record
    }

    #[rstest]
    #[case(ReadingStatus::Unread, 0.0, ReadingStatus::Read, 1.0)]
    #[case(ReadingStatus::Reading, 0.4, ReadingStatus::Reading, 0.4)]
    #[case(ReadingStatus::Read, 1.0, ReadingStatus::Read, 1.0)]
    fn test_apply_record_keeps_local_progress(
        #[case] live: ReadingStatus,
        #[case] position: f64,
        #[case] expected: ReadingStatus,
        #[case] expected_position: f64,
    ) {
        let mut chapter = chapter(live, position);
        chapter.apply_record(&record(ReadingStatus::Read, 1.0));
        assert_eq!(chapter.reading_status, expected);
        assert_eq!(chapter.reading_position, expected_position);
        assert_eq!(chapter.title, "Archived Title");
        assert!(chapter.bookmarked);
    }

    #[test]
    fn test_history_needs_a_start() {
        let mut record = record(ReadingStatus::Read, 1.0);
        record.ended_reading_at = Some(2_000);
        assert_eq!(ChapterHistory::merged(None, &chapter(ReadingStatus::Unread, 0.0), &record), None);
    }

    #[test]
    fn test_history_created_from_record() {
        let mut record = record(ReadingStatus::Read, 1.0);
        record.started_reading_at = Some(1_000);
        record.ended_reading_at = Some(2_000);
        let history = ChapterHistory::merged(None, &chapter(ReadingStatus::Unread, 0.0), &record).unwrap();
        assert_eq!(
            history,
            ChapterHistory { chapter_id: 10, novel_id: 1, started_reading_at: 1_000, ended_reading_at: Some(2_000) }
        );
    }

    #[test]
    fn test_history_keeps_existing_end() {
        let current = ChapterHistory { chapter_id: 10, novel_id: 1, started_reading_at: 500, ended_reading_at: Some(900) };
        let mut record = record(ReadingStatus::Reading, 0.5);
        record.started_reading_at = Some(1_000);
        let history = ChapterHistory::merged(Some(&current), &chapter(ReadingStatus::Read, 1.0), &record).unwrap();
        assert_eq!(history.started_reading_at, 1_000);
        assert_eq!(history.ended_reading_at, Some(900));
    }

    #[test]
    fn test_new_chapter_order_falls_back_to_index() {
        let mut record = ChapterRecord::new("/c/9", "Nine");
        assert_eq!(NewChapter::from_record(1, 7, 4, &record).order, 4.0);
        record.order = Some(12.5);
        assert_eq!(NewChapter::from_record(1, 7, 4, &record).order, 12.5);
    }
}
