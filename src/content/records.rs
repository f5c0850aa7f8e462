//! Course, lesson and comment shapes as stored in record payloads

use crate::node::micros_timestamp;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Payload of a `course` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseData {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub date_created: Option<String>,
}

/// Payload of a `course/content` record. `videoId` is null until the
/// video record exists and the content has been back-linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LessonData {
    #[serde(rename = "lessonTitle", alias = "title")]
    pub lesson_title: String,
    #[serde(rename = "videoId", default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
}

/// Payload of a `course/comments` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CommentData {
    pub author: String,
    pub text: String,
    pub date_created: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    pub date_created: Option<String>,
}

impl Course {
    /// Keep only records carrying both a title and a description
    pub(crate) fn from_data(id: &str, data: CourseData) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            title: data.title?,
            description: data.description?,
            author: data.author.unwrap_or_default(),
            date_created: data.date_created,
        })
    }
}

/// A playable lesson: content record whose video has been attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub lesson_title: String,
    pub video_id: String,
}

impl Lesson {
    pub(crate) fn from_data(id: &str, data: LessonData) -> Option<Self> {
        Some(Self {
            id: id.to_string(),
            lesson_title: data.lesson_title,
            video_id: data.video_id?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub course_id: String,
    pub author: String,
    pub text: String,
    pub date_created: String,
}

/// When a lesson video becomes visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishPolicy {
    Immediate,
    Scheduled(DateTime<Utc>),
}

impl PublishPolicy {
    /// `datePublished` value for the video record
    pub fn date_published(&self) -> String {
        match self {
            PublishPolicy::Immediate => micros_timestamp(Utc::now()),
            PublishPolicy::Scheduled(at) => micros_timestamp(*at),
        }
    }
}

/// ISO-8601 with millisecond precision, as stored in `dateCreated`
pub(crate) fn iso_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_course_requires_title_and_description() {
        let full: CourseData =
            serde_json::from_str(r#"{"title":"Intro","description":"Basics","author":"Alice"}"#).unwrap();
        let course = Course::from_data("c1", full).unwrap();
        assert_eq!(course.title, "Intro");
        assert_eq!(course.author, "Alice");

        let no_desc: CourseData = serde_json::from_str(r#"{"title":"Intro"}"#).unwrap();
        assert!(Course::from_data("c2", no_desc).is_none());
    }

    #[test]
    fn test_lesson_needs_video() {
        let pending: LessonData = serde_json::from_str(r#"{"title":"Lesson 1"}"#).unwrap();
        assert_eq!(pending.lesson_title, "Lesson 1");
        assert!(Lesson::from_data("l1", pending).is_none());

        let linked: LessonData =
            serde_json::from_str(r#"{"lessonTitle":"Lesson 1","videoId":"v1"}"#).unwrap();
        let lesson = Lesson::from_data("l1", linked).unwrap();
        assert_eq!(lesson.video_id, "v1");
    }

    #[test]
    fn test_lesson_payload_keys() {
        let data = LessonData {
            lesson_title: "Lesson 1".to_string(),
            video_id: Some("v1".to_string()),
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["lessonTitle"], "Lesson 1");
        assert_eq!(json["videoId"], "v1");
    }

    #[test]
    fn test_scheduled_publish_date() {
        let at = Utc.with_ymd_and_hms(2031, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(
            PublishPolicy::Scheduled(at).date_published(),
            "2031-03-04T05:06:07.000000Z"
        );
        assert!(PublishPolicy::Immediate.date_published().ends_with("000Z"));
    }
}
