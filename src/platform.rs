//! Platform facade
//!
//! One entry point for both the anonymous and the credentialed flow. The
//! difference is a single precondition: with `require_instructor` set,
//! authoring commands need a verified instructor credential in the session.
//!
//! Startup order is fixed: connect the identity, install and announce the
//! protocol, build the managers, then restore the session. Content
//! operations only exist after the announce step has returned.

use crate::config::PlatformConfig;
use crate::content::{Comment, Course, CourseManager, Lesson, PlayableRef, PublishPolicy};
use crate::credentials::{CredentialAuthority, InstructorCredential};
use crate::error::{PlatformError, Result};
use crate::identity::{Did, IdentityAgent};
use crate::node::DwnNode;
use crate::protocol::{dudemy_protocol, ProtocolRegistrar};
use crate::session::{SessionCache, SessionState};
use log::{info, warn};
use std::sync::Arc;

/// A request from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateCourse {
        title: String,
        description: String,
        author: String,
    },
    UploadLesson {
        course_id: String,
        title: String,
        video: Vec<u8>,
        publish: PublishPolicy,
    },
    ListCourses,
    /// Select a course and list its lessons
    SelectCourse { course_id: String },
    /// Lessons of `course_id`, or of the selected course
    ListLessons { course_id: Option<String> },
    ResolveVideo { video_id: String },
    /// Give back a URL from `ResolveVideo`
    ReleaseVideo { url: String },
    DeleteLesson { lesson_id: String },
    AddComment {
        course_id: String,
        author: String,
        text: String,
    },
    ListComments { course_id: String },
    Register { name: String, email: String },
    Login,
    Logout,
}

/// Result of a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    CourseCreated(String),
    LessonCreated(Lesson),
    Courses(Vec<Course>),
    Lessons(Vec<Lesson>),
    Video(Option<PlayableRef>),
    VideoReleased(bool),
    LessonDeleted(String),
    Comment(Comment),
    Comments(Vec<Comment>),
    LoggedIn(InstructorCredential),
    LoggedOut,
}

pub struct Platform<N: DwnNode + ?Sized> {
    config: PlatformConfig,
    agent: Arc<IdentityAgent>,
    session: SessionState,
    courses: CourseManager<N>,
    authority: CredentialAuthority<N>,
}

impl<N: DwnNode + ?Sized> Platform<N> {
    /// Bring the platform up against `node`, whose tenant must be the agent's DID
    pub async fn init(
        mut agent: IdentityAgent,
        node: Arc<N>,
        cache: SessionCache,
        config: PlatformConfig,
    ) -> Result<Self> {
        let did = agent.connect();
        if node.tenant() != &did {
            return Err(PlatformError::auth(format!(
                "node belongs to {}, agent is {}",
                node.tenant(),
                did
            )));
        }
        info!("Starting with DID: {}", did);

        let mut definition = dudemy_protocol();
        definition.protocol = config.protocol_uri.clone();
        let protocol = ProtocolRegistrar::new(node.clone()).provision(&definition).await?;

        let agent = Arc::new(agent);
        let courses = CourseManager::new(node.clone(), protocol, did.clone());
        let authority = CredentialAuthority::new(node, agent.clone(), cache, &config);

        let mut platform = Self {
            config,
            agent,
            session: SessionState::new(did),
            courses,
            authority,
        };
        if platform.config.require_instructor {
            platform.restore_session().await?;
        }
        Ok(platform)
    }

    /// Log back in from cache or durable record; a missing or invalid
    /// credential leaves the session logged out
    async fn restore_session(&mut self) -> Result<()> {
        match self.authority.login(&mut self.session).await {
            Ok(_) => Ok(()),
            Err(PlatformError::Auth(msg)) => {
                info!("Session not restored: {}", msg);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    pub fn did(&self) -> &Did {
        self.session.did()
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn agent(&self) -> &IdentityAgent {
        &self.agent
    }

    pub fn courses(&self) -> &CourseManager<N> {
        &self.courses
    }

    fn require_instructor(&self) -> Result<()> {
        if self.config.require_instructor && !self.session.is_logged_in() {
            return Err(PlatformError::auth("instructor credential required"));
        }
        Ok(())
    }

    pub async fn create_course(&self, title: &str, description: &str, author: &str) -> Result<String> {
        self.require_instructor()?;
        self.courses.create_course(title, description, author).await
    }

    pub async fn upload_lesson(
        &self,
        course_id: &str,
        title: &str,
        video: &[u8],
        publish: PublishPolicy,
    ) -> Result<Lesson> {
        self.require_instructor()?;
        self.courses.create_lesson(course_id, title, video, publish).await
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.courses.list_courses(self.config.course_limit).await
    }

    pub fn select_course(&mut self, course_id: &str) -> Result<()> {
        if course_id.is_empty() {
            return Err(PlatformError::validation("course id is required"));
        }
        self.session.set_selected_course(Some(course_id.to_string()));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.session.set_selected_course(None);
    }

    /// Lessons of `course_id`, falling back to the selected course
    pub async fn list_lessons(&self, course_id: Option<&str>) -> Result<Vec<Lesson>> {
        let course_id = course_id
            .or(self.session.selected_course())
            .ok_or_else(|| PlatformError::validation("no course selected"))?;
        self.courses.list_lessons(course_id, self.config.lesson_limit).await
    }

    pub async fn resolve_video(&self, video_id: &str) -> Option<PlayableRef> {
        self.courses.resolve_video_url(video_id).await
    }

    pub async fn release_video(&self, url: &str) -> bool {
        self.courses.release_video_url(url).await
    }

    pub async fn delete_lesson(&self, lesson_id: &str) -> Result<()> {
        self.require_instructor()?;
        self.courses.delete_lesson(lesson_id).await
    }

    pub async fn add_comment(&self, course_id: &str, author: &str, text: &str) -> Result<Comment> {
        self.courses.add_comment(course_id, author, text).await
    }

    pub async fn list_comments(&self, course_id: &str) -> Result<Vec<Comment>> {
        self.courses.list_comments(course_id, self.config.comment_limit).await
    }

    pub async fn register(&mut self, name: &str, email: &str) -> Result<InstructorCredential> {
        self.authority.register(&mut self.session, name, email).await
    }

    pub async fn login(&mut self) -> Result<InstructorCredential> {
        self.authority.login(&mut self.session).await
    }

    pub async fn logout(&mut self) {
        self.authority.logout(&mut self.session).await
    }

    /// Run one command
    pub async fn execute(&mut self, command: Command) -> Result<CommandOutput> {
        let output = match command {
            Command::CreateCourse {
                title,
                description,
                author,
            } => CommandOutput::CourseCreated(self.create_course(&title, &description, &author).await?),
            Command::UploadLesson {
                course_id,
                title,
                video,
                publish,
            } => CommandOutput::LessonCreated(self.upload_lesson(&course_id, &title, &video, publish).await?),
            Command::ListCourses => CommandOutput::Courses(self.list_courses().await?),
            Command::SelectCourse { course_id } => {
                self.select_course(&course_id)?;
                CommandOutput::Lessons(self.list_lessons(None).await?)
            }
            Command::ListLessons { course_id } => {
                CommandOutput::Lessons(self.list_lessons(course_id.as_deref()).await?)
            }
            Command::ResolveVideo { video_id } => {
                let playable = self.resolve_video(&video_id).await;
                if playable.is_none() {
                    warn!("Skipping video {}: nothing to play", video_id);
                }
                CommandOutput::Video(playable)
            }
            Command::ReleaseVideo { url } => CommandOutput::VideoReleased(self.release_video(&url).await),
            Command::DeleteLesson { lesson_id } => {
                self.delete_lesson(&lesson_id).await?;
                CommandOutput::LessonDeleted(lesson_id)
            }
            Command::AddComment {
                course_id,
                author,
                text,
            } => CommandOutput::Comment(self.add_comment(&course_id, &author, &text).await?),
            Command::ListComments { course_id } => CommandOutput::Comments(self.list_comments(&course_id).await?),
            Command::Register { name, email } => CommandOutput::LoggedIn(self.register(&name, &email).await?),
            Command::Login => CommandOutput::LoggedIn(self.login().await?),
            Command::Logout => {
                self.logout().await;
                CommandOutput::LoggedOut
            }
        };
        Ok(output)
    }
}
