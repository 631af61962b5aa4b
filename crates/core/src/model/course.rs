use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("module {0} appears more than once in the course")]
    DuplicateModule(ModuleId),

    #[error("lesson {0} appears more than once in the course")]
    DuplicateLesson(LessonId),

    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("{kind} content must be an absolute URL, got {raw:?}")]
    InvalidContentUrl { kind: ContentType, raw: String },
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// The four kinds of lesson content the platform serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Video,
    Text,
    Pdf,
    Link,
}

impl ContentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Text => "text",
            ContentType::Pdf => "pdf",
            ContentType::Link => "link",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = CourseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "video" => Ok(Self::Video),
            "text" => Ok(Self::Text),
            "pdf" => Ok(Self::Pdf),
            "link" => Ok(Self::Link),
            other => Err(CourseError::UnknownContentType(other.to_string())),
        }
    }
}

/// Lesson payload, typed by content kind.
///
/// Everything except `Text` points at a resource and is kept as a parsed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonContent {
    Video(Url),
    Text(String),
    Pdf(Url),
    Link(Url),
}

impl LessonContent {
    /// Build the content for `kind` from the raw payload string.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::InvalidContentUrl` if a URL-backed kind carries
    /// a payload that is not an absolute URL.
    pub fn parse(kind: ContentType, payload: impl Into<String>) -> Result<Self, CourseError> {
        let payload = payload.into();
        let wrap: fn(Url) -> Self = match kind {
            ContentType::Text => return Ok(Self::Text(payload)),
            ContentType::Video => Self::Video,
            ContentType::Pdf => Self::Pdf,
            ContentType::Link => Self::Link,
        };

        Url::parse(payload.trim())
            .map(wrap)
            .map_err(|_| CourseError::InvalidContentUrl { kind, raw: payload })
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match self {
            LessonContent::Video(_) => ContentType::Video,
            LessonContent::Text(_) => ContentType::Text,
            LessonContent::Pdf(_) => ContentType::Pdf,
            LessonContent::Link(_) => ContentType::Link,
        }
    }

    #[must_use]
    pub fn url(&self) -> Option<&Url> {
        match self {
            LessonContent::Video(u) | LessonContent::Pdf(u) | LessonContent::Link(u) => Some(u),
            LessonContent::Text(_) => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            LessonContent::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// True for videos hosted on YouTube, which are played through an embed
    /// rather than a direct file player.
    #[must_use]
    pub fn is_embedded_video(&self) -> bool {
        let LessonContent::Video(url) = self else {
            return false;
        };
        url.host_str().is_some_and(|host| {
            host == "youtu.be" || host == "youtube.com" || host.ends_with(".youtube.com")
        })
    }
}

//
// ─── COURSE TREE ───────────────────────────────────────────────────────────────
//

/// Atomic content unit of a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    title: String,
    content: LessonContent,
    estimated_duration_minutes: u32,
}

impl Lesson {
    #[must_use]
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        content: LessonContent,
        estimated_duration_minutes: u32,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            content,
            estimated_duration_minutes,
        }
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &LessonContent {
        &self.content
    }

    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.content.content_type()
    }

    #[must_use]
    pub fn estimated_duration_minutes(&self) -> u32 {
        self.estimated_duration_minutes
    }
}

/// Ordered group of lessons. Lesson order is the order given at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    id: ModuleId,
    title: String,
    lessons: Vec<Lesson>,
}

impl Module {
    #[must_use]
    pub fn new(id: ModuleId, title: impl Into<String>, lessons: Vec<Lesson>) -> Self {
        Self {
            id,
            title: title.into(),
            lessons,
        }
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    /// Lesson `id` if it belongs to this module.
    #[must_use]
    pub fn lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    /// Sum of the lessons' estimated minutes, saturating.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.lessons
            .iter()
            .map(Lesson::estimated_duration_minutes)
            .fold(0, u32::saturating_add)
    }
}

/// Read-only course snapshot.
///
/// Module ids and lesson ids are unique across the whole course, so any id
/// resolves to at most one place in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    id: CourseId,
    title: String,
    modules: Vec<Module>,
}

impl Course {
    /// Assemble a course from ordered modules.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::DuplicateModule` or `CourseError::DuplicateLesson`
    /// when an id repeats.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        modules: Vec<Module>,
    ) -> Result<Self, CourseError> {
        let mut module_ids = HashSet::with_capacity(modules.len());
        let mut lesson_ids = HashSet::new();
        for module in &modules {
            if !module_ids.insert(module.id) {
                return Err(CourseError::DuplicateModule(module.id));
            }
            for lesson in &module.lessons {
                if !lesson_ids.insert(lesson.id) {
                    return Err(CourseError::DuplicateLesson(lesson.id));
                }
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            modules,
        })
    }

    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Module `id`, or `None` if the course has no such module.
    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    /// Lessons across all modules.
    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons.len()).sum()
    }

    #[must_use]
    pub fn contains_lesson(&self, id: LessonId) -> bool {
        self.modules.iter().any(|m| m.lesson(id).is_some())
    }
}
