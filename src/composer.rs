use crate::error::{ComposeError, FetchError, PermissionError, ValidationError};
use crate::gateway::{Gateway, NewPostRecord};
use crate::hashtags::extract_hashtags;
use chrono::{DateTime, Utc};
use std::fs::File;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComposerField {
    #[default]
    Title,
    Content,
    Image,
}

impl ComposerField {
    pub fn next(self) -> Self {
        match self {
            ComposerField::Title => ComposerField::Content,
            ComposerField::Content => ComposerField::Image,
            ComposerField::Image => ComposerField::Title,
        }
    }
}

/// Form state for a new post.
#[derive(Debug, Clone, Default)]
pub struct PostComposer {
    title: String,
    content: String,
    image_input: String,
    image: Option<String>,
    hashtags: Vec<String>,
    focus: ComposerField,
    loading: bool,
    status: Option<String>,
}

impl PostComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn image_input(&self) -> &str {
        &self.image_input
    }

    /// Hashtags found in the current content.
    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub fn focus(&self) -> ComposerField {
        self.focus
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.hashtags = extract_hashtags(&self.content);
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn insert_char(&mut self, c: char) {
        match self.focus {
            ComposerField::Title => self.title.push(c),
            ComposerField::Content => {
                self.content.push(c);
                self.hashtags = extract_hashtags(&self.content);
            }
            ComposerField::Image => self.image_input.push(c),
        }
    }

    pub fn delete_char(&mut self) {
        match self.focus {
            ComposerField::Title => {
                self.title.pop();
            }
            ComposerField::Content => {
                self.content.pop();
                self.hashtags = extract_hashtags(&self.content);
            }
            ComposerField::Image => {
                self.image_input.pop();
            }
        }
    }

    /// Use the file at `path` as the post image.
    ///
    /// An empty path is a cancelled pick and changes nothing (`Ok(false)`).
    /// The file has to be readable; the path itself is what gets stored.
    pub fn pick_image(&mut self, path: &str) -> Result<bool, PermissionError> {
        let path = path.trim();
        if path.is_empty() {
            return Ok(false);
        }

        let readable = File::open(path).and_then(|file| file.metadata());
        let denied = match readable {
            Ok(meta) if meta.is_file() => None,
            Ok(_) => Some("not a regular file".to_string()),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = denied {
            let err = PermissionError {
                path: path.to_string(),
                reason,
            };
            self.status = Some(err.to_string());
            return Err(err);
        }

        self.image = Some(path.to_string());
        self.image_input = path.to_string();
        self.status = None;
        Ok(true)
    }

    /// Pick whatever path has been typed into the image field.
    pub fn pick_typed_image(&mut self) -> Result<bool, PermissionError> {
        let path = self.image_input.clone();
        self.pick_image(&path)
    }

    pub fn validate(&self, now: DateTime<Utc>) -> Result<NewPostRecord, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::MissingContent);
        }
        let Some(image) = self.image.as_ref() else {
            return Err(ValidationError::MissingImage);
        };

        Ok(NewPostRecord {
            title: self.title.clone(),
            content: self.content.clone(),
            image_url: image.clone(),
            created_at: now,
        })
    }

    /// Validate and enter the loading state. The returned record is what
    /// should be written; hand the write's outcome to `finish_submit`.
    pub fn begin_submit(&mut self, now: DateTime<Utc>) -> Result<NewPostRecord, ValidationError> {
        match self.validate(now) {
            Ok(record) => {
                self.loading = true;
                self.status = None;
                Ok(record)
            }
            Err(err) => {
                self.status = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn finish_submit(&mut self, result: Result<(), FetchError>) -> Result<(), ComposeError> {
        self.loading = false;
        match result {
            Ok(()) => {
                info!(title = %self.title, "post created");
                self.status = Some("Post created successfully".to_string());
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "error creating post");
                self.status = Some(err.message.clone());
                Err(err.into())
            }
        }
    }

    /// Validate, write one upsert, and record the outcome.
    pub async fn submit<G>(&mut self, gateway: &G) -> Result<(), ComposeError>
    where
        G: Gateway + ?Sized,
    {
        let record = self.begin_submit(Utc::now())?;
        let result = gateway.upsert_post(record).await;
        self.finish_submit(result)
    }
}
