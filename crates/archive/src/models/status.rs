use serde::{Deserialize, Serialize};

/// Publication state of a novel, as reported by its source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NovelStatus {
    Publishing,
    Completed,
    Paused,
    #[default]
    #[serde(other)]
    Unknown,
}

/// How far the reader has got with a chapter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReadingStatus {
    #[default]
    Unread,
    Reading,
    Read,
}

impl ReadingStatus {
    /// Returns `true` once the reader has opened the chapter at all.
    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Unread)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChapterSortType {
    #[default]
    Source,
    Upload,
}

macro_rules! impl_as_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Wire name of the variant.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(other.to_string()),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_as_str!(NovelStatus {
    Publishing => "PUBLISHING",
    Completed => "COMPLETED",
    Paused => "PAUSED",
    Unknown => "UNKNOWN",
});
impl_as_str!(ReadingStatus {
    Unread => "UNREAD",
    Reading => "READING",
    Read => "READ",
});
impl_as_str!(ChapterSortType {
    Source => "SOURCE",
    Upload => "UPLOAD",
});
