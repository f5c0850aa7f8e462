//! Content hierarchy
//!
//! Courses, lessons (content + video) and comments stored as protocol
//! records, plus playable references for resolved videos.

mod manager;
mod media;
mod records;

pub use manager::CourseManager;
pub use media::{MediaUrls, PlayableRef};
pub use records::{Comment, Course, Lesson, PublishPolicy};
