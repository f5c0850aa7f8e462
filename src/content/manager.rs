//! Course manager: the course → content → video tree on a storage node
//!
//! Listing operations fetch details for every queried record concurrently
//! and drop any record that cannot be read or parsed, so a single bad record
//! never fails a whole listing.

use super::media::{MediaUrls, PlayableRef};
use super::records::{iso_now, Comment, CommentData, Course, CourseData, Lesson, LessonData, PublishPolicy};
use crate::error::{PlatformError, Result};
use crate::identity::Did;
use crate::node::{CreateRecord, DwnNode, Record, RecordData, RecordEntry, RecordMessage, RecordsFilter};
use crate::protocol::{AnnouncedProtocol, COMMENTS_PATH, CONTENT_PATH, COURSE_PATH, VIDEO_PATH};
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

pub struct CourseManager<N: DwnNode + ?Sized> {
    node: Arc<N>,
    protocol: AnnouncedProtocol,
    did: Did,
    media: MediaUrls,
}

impl<N: DwnNode + ?Sized> CourseManager<N> {
    /// Requires an announced protocol: content writes under an unannounced
    /// protocol fail with protocol-not-found.
    pub fn new(node: Arc<N>, protocol: AnnouncedProtocol, did: Did) -> Self {
        Self {
            node,
            protocol,
            did,
            media: MediaUrls::new(),
        }
    }

    pub fn did(&self) -> &Did {
        &self.did
    }

    pub fn protocol(&self) -> &AnnouncedProtocol {
        &self.protocol
    }

    pub fn media(&self) -> &MediaUrls {
        &self.media
    }

    /// Message for a record at `path`, with the schema and format the protocol declares
    fn message_for(&self, path: &str) -> Result<RecordMessage> {
        let declared = self
            .protocol
            .definition()
            .type_at(path)
            .ok_or_else(|| PlatformError::Protocol(format!("{} not in protocol", path)))?;
        let format = declared
            .data_formats
            .first()
            .ok_or_else(|| PlatformError::Protocol(format!("{} accepts no data format", path)))?;
        Ok(RecordMessage::protocol(self.protocol.uri(), path, format)
            .with_schema(declared.schema.as_deref()))
    }

    fn schema_of(&self, path: &str) -> Option<String> {
        self.protocol.definition().type_at(path)?.schema.clone()
    }

    /// Read every entry's record concurrently, keeping the ones `parse` accepts
    async fn read_all<T, F>(&self, entries: Vec<RecordEntry>, parse: F) -> Vec<T>
    where
        F: Fn(&Record) -> Option<T>,
    {
        let reads = entries.iter().map(|entry| self.node.read_record(&self.did, &entry.id));
        join_all(reads)
            .await
            .into_iter()
            .zip(&entries)
            .filter_map(|(result, entry)| match result {
                Ok(record) => parse(&record),
                Err(e) => {
                    warn!("Dropping record {}: {}", entry.id, e);
                    None
                }
            })
            .collect()
    }

    /// Courses under the protocol. No author filter is applied: any record
    /// with a title and description is listed, whoever wrote it.
    pub async fn list_courses(&self, limit: usize) -> Result<Vec<Course>> {
        let filter = RecordsFilter::protocol(self.protocol.uri());
        let entries = self.node.query_records(&self.did, &filter, Some(limit)).await?;
        let courses = self
            .read_all(entries, |record| {
                let data = record.data.json::<CourseData>().ok()?;
                Course::from_data(&record.id, data)
            })
            .await;
        debug!("Listed {} courses", courses.len());
        Ok(courses)
    }

    pub async fn create_course(&self, title: &str, description: &str, author: &str) -> Result<String> {
        if title.is_empty() || description.is_empty() || author.is_empty() {
            return Err(PlatformError::validation(
                "course title, description and author are required",
            ));
        }
        let data = RecordData::from_json(&CourseData {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            author: Some(author.to_string()),
            date_created: Some(iso_now()),
        })?;
        let message = self.message_for(COURSE_PATH)?.published(None);

        let record = self
            .node
            .create_record(&self.did, CreateRecord::new(data, message))
            .await?;
        self.node.send_record(&record.id, self.protocol.owner()).await?;
        info!("Course created with ID: {}", record.id);

        let fetched = self.node.read_record(&self.did, &record.id).await?;
        debug!("Fetched course data: {:?}", fetched.data.json::<CourseData>().ok());
        Ok(record.id)
    }

    /// Two-phase lesson creation: content metadata, then the video under it,
    /// then the content back-linked to the video. If the back-link fails the
    /// content record stays without `videoId` and never shows up in listings.
    pub async fn create_lesson(
        &self,
        course_id: &str,
        title: &str,
        video: &[u8],
        publish: PublishPolicy,
    ) -> Result<Lesson> {
        if course_id.is_empty() {
            return Err(PlatformError::validation("course id is required"));
        }
        if title.is_empty() || video.is_empty() {
            return Err(PlatformError::validation("lesson title and video are required"));
        }

        let draft = LessonData {
            lesson_title: title.to_string(),
            video_id: None,
        };
        let content_msg = self
            .message_for(CONTENT_PATH)?
            .with_parent(course_id, course_id)
            .published(None);
        let content = self
            .node
            .create_record(&self.did, CreateRecord::new(RecordData::from_json(&draft)?, content_msg))
            .await?;

        let video_msg = self
            .message_for(VIDEO_PATH)?
            .with_parent(&content.id, course_id)
            .published(Some(publish.date_published()));
        let video_record = self
            .node
            .create_record(&self.did, CreateRecord::new(RecordData::from_bytes(video), video_msg))
            .await?;
        self.node.send_record(&video_record.id, self.protocol.owner()).await?;
        info!("Video uploaded with ID: {}", video_record.id);

        let current = self.node.read_record(&self.did, &content.id).await?;
        let linked = LessonData {
            lesson_title: title.to_string(),
            video_id: Some(video_record.id.clone()),
        };
        self.node
            .update_record(&self.did, &current.id, RecordData::from_json(&linked)?)
            .await?;

        let updated = self.node.read_record(&self.did, &content.id).await?;
        debug!("Updated content data: {:?}", updated.data.json::<LessonData>().ok());

        Ok(Lesson {
            id: content.id,
            lesson_title: linked.lesson_title,
            video_id: video_record.id,
        })
    }

    /// Playable lessons of a course; content without a video is skipped
    pub async fn list_lessons(&self, course_id: &str, limit: usize) -> Result<Vec<Lesson>> {
        let mut filter = RecordsFilter::protocol(self.protocol.uri()).and_context(course_id);
        if let Some(schema) = self.schema_of(CONTENT_PATH) {
            filter = filter.and_schema(&schema);
        }
        let entries = self.node.query_records(&self.did, &filter, Some(limit)).await?;
        let lessons = self
            .read_all(entries, |record| {
                let data = match record.data.json::<LessonData>() {
                    Ok(data) => data,
                    Err(e) => {
                        warn!("Error reading lesson record {}: {}", record.id, e);
                        return None;
                    }
                };
                let lesson = Lesson::from_data(&record.id, data);
                if lesson.is_none() {
                    debug!("Skipping lesson with no videoId: {}", record.id);
                }
                lesson
            })
            .await;
        debug!("Fetched {} lessons for course {}", lessons.len(), course_id);
        Ok(lessons)
    }

    /// Resolve a video record to a playable reference; absent when the
    /// record or its payload is missing
    pub async fn resolve_video_url(&self, video_id: &str) -> Option<PlayableRef> {
        if let Some(playable) = self.media.reference(video_id).await {
            return Some(playable);
        }
        let record = match self.node.read_record(&self.did, video_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("Could not resolve video URL for videoId {}: {}", video_id, e);
                return None;
            }
        };
        if record.data.is_empty() {
            warn!("Video record {} has no payload", video_id);
            return None;
        }
        let mime_type = record.descriptor.message.data_format.clone();
        Some(self.media.register(video_id, record.data.into_bytes(), &mime_type).await)
    }

    /// Release a URL handed out by `resolve_video_url`
    pub async fn release_video_url(&self, url: &str) -> bool {
        self.media.revoke(url).await
    }

    /// Delete a lesson record. Cached listings are not refreshed here.
    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<()> {
        if lesson_id.is_empty() {
            return Err(PlatformError::validation("lesson id is required"));
        }
        self.node.delete_record(&self.did, lesson_id).await?;
        info!("Deleted lesson {}", lesson_id);
        Ok(())
    }

    pub async fn add_comment(&self, course_id: &str, author: &str, text: &str) -> Result<Comment> {
        if course_id.is_empty() || author.is_empty() || text.is_empty() {
            return Err(PlatformError::validation("course id, author and text are required"));
        }
        let data = CommentData {
            author: author.to_string(),
            text: text.to_string(),
            date_created: iso_now(),
        };
        let message = self
            .message_for(COMMENTS_PATH)?
            .with_parent(course_id, course_id)
            .published(None);
        let record = self
            .node
            .create_record(&self.did, CreateRecord::new(RecordData::from_json(&data)?, message))
            .await?;
        Ok(Comment {
            id: record.id,
            course_id: course_id.to_string(),
            author: data.author,
            text: data.text,
            date_created: data.date_created,
        })
    }

    pub async fn list_comments(&self, course_id: &str, limit: usize) -> Result<Vec<Comment>> {
        let filter = RecordsFilter::protocol(self.protocol.uri())
            .and_path(COMMENTS_PATH)
            .and_context(course_id);
        let entries = self.node.query_records(&self.did, &filter, Some(limit)).await?;
        Ok(self
            .read_all(entries, |record| {
                let data = record.data.json::<CommentData>().ok()?;
                Some(Comment {
                    id: record.id.clone(),
                    course_id: course_id.to_string(),
                    author: data.author,
                    text: data.text,
                    date_created: data.date_created,
                })
            })
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DidResolver, KeyStore};
    use crate::node::{ConfigureStatus, InMemoryNode, NodeError, NodeNetwork};
    use crate::protocol::{dudemy_protocol, ProtocolDefinition, ProtocolRegistrar, DUDEMY_PROTOCOL, JSON_FORMAT};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Delegates to an in-memory node, failing reads of chosen records
    struct FailingReads {
        inner: Arc<InMemoryNode>,
        failing: Mutex<HashSet<String>>,
    }

    impl FailingReads {
        fn fail_reads_of(&self, record_id: &str) {
            self.failing.lock().unwrap().insert(record_id.to_string());
        }
    }

    #[async_trait]
    impl DwnNode for FailingReads {
        fn tenant(&self) -> &Did {
            self.inner.tenant()
        }

        async fn configure_protocol(
            &self,
            author: &Did,
            definition: &ProtocolDefinition,
        ) -> std::result::Result<ConfigureStatus, NodeError> {
            self.inner.configure_protocol(author, definition).await
        }

        async fn send_protocol(&self, protocol: &str, target: &Did) -> std::result::Result<(), NodeError> {
            self.inner.send_protocol(protocol, target).await
        }

        async fn create_record(&self, author: &Did, request: CreateRecord) -> std::result::Result<Record, NodeError> {
            self.inner.create_record(author, request).await
        }

        async fn read_record(&self, reader: &Did, record_id: &str) -> std::result::Result<Record, NodeError> {
            if self.failing.lock().unwrap().contains(record_id) {
                return Err(NodeError::Storage(format!("read of {} failed", record_id)));
            }
            self.inner.read_record(reader, record_id).await
        }

        async fn query_records(
            &self,
            reader: &Did,
            filter: &RecordsFilter,
            limit: Option<usize>,
        ) -> std::result::Result<Vec<RecordEntry>, NodeError> {
            self.inner.query_records(reader, filter, limit).await
        }

        async fn update_record(
            &self,
            author: &Did,
            record_id: &str,
            data: RecordData,
        ) -> std::result::Result<Record, NodeError> {
            self.inner.update_record(author, record_id, data).await
        }

        async fn delete_record(&self, author: &Did, record_id: &str) -> std::result::Result<(), NodeError> {
            self.inner.delete_record(author, record_id).await
        }

        async fn send_record(&self, record_id: &str, target: &Did) -> std::result::Result<(), NodeError> {
            self.inner.send_record(record_id, target).await
        }
    }

    async fn manager() -> (CourseManager<InMemoryNode>, Arc<InMemoryNode>) {
        let mut keys = KeyStore::new();
        let did = keys.generate();
        let node = InMemoryNode::standalone(did.clone()).await;
        let protocol = ProtocolRegistrar::new(node.clone())
            .provision(&dudemy_protocol())
            .await
            .unwrap();
        (CourseManager::new(node.clone(), protocol, did), node)
    }

    #[tokio::test]
    async fn test_create_course_validation() {
        let (mgr, _) = manager().await;
        for (t, d, a) in [("", "d", "a"), ("t", "", "a"), ("t", "d", "")] {
            let err = mgr.create_course(t, d, a).await.unwrap_err();
            assert!(matches!(err, PlatformError::Validation(_)), "{:?}", (t, d, a));
        }
        let id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        assert!(!id.is_empty());
    }

    #[tokio::test]
    async fn test_list_courses_drops_incomplete_records() {
        let (mgr, node) = manager().await;
        let id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();

        // a course record without a description
        let incomplete = CreateRecord::new(
            RecordData::from_json(&json!({"title": "Draft"})).unwrap(),
            mgr.message_for(COURSE_PATH).unwrap(),
        );
        node.create_record(mgr.did(), incomplete).await.unwrap();

        let courses = mgr.list_courses(5).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, id);
        assert_eq!(courses[0].title, "Intro");
        assert_eq!(courses[0].description, "A basic course");
        assert_eq!(courses[0].author, "Alice");
    }

    #[tokio::test]
    async fn test_list_courses_skips_video_payloads() {
        let (mgr, _) = manager().await;
        let id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        mgr.create_lesson(&id, "Lesson 1", b"\x00\x00\x00\x18ftypmp42", PublishPolicy::Immediate)
            .await
            .unwrap();

        let courses = mgr.list_courses(10).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, id);
    }

    #[tokio::test]
    async fn test_lesson_two_phase_creation() {
        let (mgr, node) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let payload = b"fake mp4 bytes".to_vec();

        let lesson = mgr
            .create_lesson(&course_id, "Lesson 1", &payload, PublishPolicy::Immediate)
            .await
            .unwrap();

        let lessons = mgr.list_lessons(&course_id, 3).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson_title, "Lesson 1");
        assert_eq!(lessons[0], lesson);

        let video = node.read_record(mgr.did(), &lesson.video_id).await.unwrap();
        assert_eq!(video.descriptor.message.parent_id.as_deref(), Some(lesson.id.as_str()));
        assert_eq!(video.descriptor.message.context_id.as_deref(), Some(course_id.as_str()));
        assert!(video.descriptor.message.date_published.as_deref().unwrap().ends_with("000Z"));

        let playable = mgr.resolve_video_url(&lessons[0].video_id).await.unwrap();
        assert_eq!(playable.mime_type, "video/mp4");
        let bytes = mgr.media().fetch(&playable.url).await.unwrap();
        assert_eq!(&bytes[..], payload.as_slice());
    }

    #[tokio::test]
    async fn test_scheduled_lesson_keeps_publish_date() {
        let (mgr, node) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let at = Utc::now() + Duration::days(7);

        let lesson = mgr
            .create_lesson(&course_id, "Later", b"bytes", PublishPolicy::Scheduled(at))
            .await
            .unwrap();
        let video = node.read_record(mgr.did(), &lesson.video_id).await.unwrap();
        assert_eq!(
            video.descriptor.message.date_published,
            Some(crate::node::micros_timestamp(at))
        );
    }

    #[tokio::test]
    async fn test_lesson_validation() {
        let (mgr, _) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();

        let err = mgr
            .create_lesson(&course_id, "", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Validation(_)));

        let err = mgr
            .create_lesson(&course_id, "Lesson 1", b"", PublishPolicy::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Validation(_)));
        assert!(mgr.list_lessons(&course_id, 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lesson_under_missing_course_is_protocol_error() {
        let (mgr, _) = manager().await;
        let err = mgr
            .create_lesson("no-such-course", "Lesson 1", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_orphan_content_is_hidden() {
        let (mgr, node) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();

        // metadata phase only, as if the video upload failed
        let orphan = CreateRecord::new(
            RecordData::from_json(&json!({"title": "Broken"})).unwrap(),
            mgr.message_for(CONTENT_PATH).unwrap().with_parent(&course_id, &course_id),
        );
        node.create_record(mgr.did(), orphan).await.unwrap();
        mgr.create_lesson(&course_id, "Lesson 1", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap();

        let lessons = mgr.list_lessons(&course_id, 10).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert!(lessons.iter().all(|l| !l.video_id.is_empty()));
        assert_eq!(lessons[0].lesson_title, "Lesson 1");
    }

    #[tokio::test]
    async fn test_malformed_lesson_does_not_fail_listing() {
        let (mgr, node) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();

        let garbage = CreateRecord::new(
            RecordData::from_bytes(b"not json".to_vec()),
            mgr.message_for(CONTENT_PATH).unwrap().with_parent(&course_id, &course_id),
        );
        node.create_record(mgr.did(), garbage).await.unwrap();
        mgr.create_lesson(&course_id, "Lesson 1", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap();

        let lessons = mgr.list_lessons(&course_id, 10).await.unwrap();
        assert_eq!(lessons.len(), 1);
    }

    #[tokio::test]
    async fn test_lessons_scoped_to_course() {
        let (mgr, _) = manager().await;
        let a = mgr.create_course("A", "first", "Alice").await.unwrap();
        let b = mgr.create_course("B", "second", "Alice").await.unwrap();
        mgr.create_lesson(&a, "A1", b"a", PublishPolicy::Immediate).await.unwrap();
        mgr.create_lesson(&b, "B1", b"b", PublishPolicy::Immediate).await.unwrap();

        let lessons = mgr.list_lessons(&a, 10).await.unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].lesson_title, "A1");
    }

    #[tokio::test]
    async fn test_delete_lesson() {
        let (mgr, _) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let first = mgr
            .create_lesson(&course_id, "Lesson 1", b"one", PublishPolicy::Immediate)
            .await
            .unwrap();
        let second = mgr
            .create_lesson(&course_id, "Lesson 2", b"two", PublishPolicy::Immediate)
            .await
            .unwrap();

        mgr.delete_lesson(&first.id).await.unwrap();
        let lessons = mgr.list_lessons(&course_id, 10).await.unwrap();
        assert!(lessons.iter().all(|l| l.id != first.id));
        assert!(lessons.iter().any(|l| l.id == second.id));

        let err = mgr.delete_lesson(&first.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_resolve_missing_video_is_absent() {
        let (mgr, node) = manager().await;
        assert!(mgr.resolve_video_url("missing").await.is_none());

        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let lesson = mgr
            .create_lesson(&course_id, "Lesson 1", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap();
        node.update_record(mgr.did(), &lesson.video_id, RecordData::default())
            .await
            .unwrap();
        assert!(mgr.resolve_video_url(&lesson.video_id).await.is_none());
    }

    #[tokio::test]
    async fn test_repeated_resolution_reuses_url() {
        let (mgr, _) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let lesson = mgr
            .create_lesson(&course_id, "Lesson 1", b"bytes", PublishPolicy::Immediate)
            .await
            .unwrap();

        let first = mgr.resolve_video_url(&lesson.video_id).await.unwrap();
        for _ in 0..5 {
            let again = mgr.resolve_video_url(&lesson.video_id).await.unwrap();
            assert_eq!(again, first);
        }
        assert_eq!(mgr.media().len().await, 1);

        assert!(mgr.release_video_url(&first.url).await);
        assert!(mgr.media().is_empty().await);
        assert!(!mgr.release_video_url(&first.url).await);
    }

    #[tokio::test]
    async fn test_failed_reads_do_not_fail_listings() {
        let mut keys = KeyStore::new();
        let did = keys.generate();
        let node = Arc::new(FailingReads {
            inner: InMemoryNode::standalone(did.clone()).await,
            failing: Mutex::new(HashSet::new()),
        });
        let protocol = ProtocolRegistrar::new(node.clone())
            .provision(&dudemy_protocol())
            .await
            .unwrap();
        let mgr = CourseManager::new(node.clone(), protocol, did);

        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        let broken_course = mgr.create_course("Broken", "Unreadable", "Alice").await.unwrap();
        let kept = mgr
            .create_lesson(&course_id, "Lesson 1", b"one", PublishPolicy::Immediate)
            .await
            .unwrap();
        let broken_lesson = mgr
            .create_lesson(&course_id, "Lesson 2", b"two", PublishPolicy::Immediate)
            .await
            .unwrap();

        node.fail_reads_of(&broken_course);
        node.fail_reads_of(&broken_lesson.id);

        let courses = mgr.list_courses(10).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].id, course_id);

        let lessons = mgr.list_lessons(&course_id, 10).await.unwrap();
        assert_eq!(lessons, vec![kept]);
    }

    #[tokio::test]
    async fn test_comments() {
        let (mgr, _) = manager().await;
        let course_id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        mgr.add_comment(&course_id, "Bob", "Great course").await.unwrap();
        mgr.add_comment(&course_id, "Carol", "Thanks").await.unwrap();

        let comments = mgr.list_comments(&course_id, 10).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "Bob");
        assert_eq!(comments[1].text, "Thanks");

        let err = mgr.add_comment(&course_id, "Bob", "").await.unwrap_err();
        assert!(matches!(err, PlatformError::Validation(_)));
    }

    #[tokio::test]
    async fn test_course_reaches_owner_endpoint() {
        let mut keys = KeyStore::new();
        let did = keys.generate();
        let network = NodeNetwork::new(Arc::new(DidResolver::new()));
        let local = InMemoryNode::new(did.clone(), network.clone()).await;
        let remote = InMemoryNode::new(did.clone(), network.clone()).await;
        network.publish(&remote).await;

        let protocol = ProtocolRegistrar::new(local.clone())
            .provision(&dudemy_protocol())
            .await
            .unwrap();
        let mgr = CourseManager::new(local, protocol, did);
        let id = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap();
        assert!(remote.contains(&id).await);
    }

    #[tokio::test]
    async fn test_unpublished_endpoint_surfaces_transport_error() {
        let mut keys = KeyStore::new();
        let did = keys.generate();
        let network = NodeNetwork::new(Arc::new(DidResolver::new()));
        let local = InMemoryNode::new(did.clone(), network.clone()).await;
        let remote = InMemoryNode::new(did.clone(), network.clone()).await;
        network.publish(&remote).await;
        let protocol = ProtocolRegistrar::new(local.clone())
            .provision(&dudemy_protocol())
            .await
            .unwrap();
        drop(remote);

        let mgr = CourseManager::new(local, protocol, did);
        let err = mgr.create_course("Intro", "A basic course", "Alice").await.unwrap_err();
        assert!(matches!(err, PlatformError::Transport(_)));
    }

    #[tokio::test]
    async fn test_message_for_uses_declared_schema() {
        let (mgr, _) = manager().await;
        let msg = mgr.message_for(CONTENT_PATH).unwrap();
        assert_eq!(msg.protocol.as_deref(), Some(DUDEMY_PROTOCOL));
        assert_eq!(msg.data_format, JSON_FORMAT);
        assert_eq!(msg.schema.as_deref(), Some("https://example.com/dudemy/schema2"));
        assert!(mgr.message_for("course/quiz").is_err());
    }
}
