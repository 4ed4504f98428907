//! Create, edit and comment submissions.
//!
//! Each form kind has a fixed field list. Every field's parse/validate
//! handler comes from [`FIELD_TABLE`] and is bound when the form is built,
//! so submitting never looks anything up by name.

use crate::IssueKey;
use crate::error::ErrorCode;
use crate::tree::Item;
use serde::Serialize;

const MAX_TITLE_CHARS: usize = 256;
const MAX_LABEL_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Title,
    Body,
    Labels,
    Assignee,
    Milestone,
    State,
}

impl FieldKind {
    /// Form-encoded parameter name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::Labels => "labels",
            Self::Assignee => "assignee",
            Self::Milestone => "milestone",
            Self::State => "state",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Body => "Body",
            Self::Labels => "Labels",
            Self::Assignee => "Assignee",
            Self::Milestone => "Milestone",
            Self::State => "State",
        }
    }

    /// Multi-line editing in the TUI.
    #[must_use]
    pub const fn is_multiline(self) -> bool {
        matches!(self, Self::Body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {message}", .field.label())]
pub struct FieldError {
    pub field: FieldKind,
    pub message: String,
}

impl FieldError {
    fn new(field: FieldKind, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidFieldValue
    }
}

/// Normalizes raw input; `Ok(None)` means "omit from the submission".
type FieldHandler = fn(&str) -> Result<Option<String>, FieldError>;

pub struct FieldEntry {
    pub kind: FieldKind,
    handler: FieldHandler,
}

pub static FIELD_TABLE: [FieldEntry; 6] = [
    FieldEntry {
        kind: FieldKind::Title,
        handler: parse_title,
    },
    FieldEntry {
        kind: FieldKind::Body,
        handler: parse_body,
    },
    FieldEntry {
        kind: FieldKind::Labels,
        handler: parse_labels,
    },
    FieldEntry {
        kind: FieldKind::Assignee,
        handler: parse_assignee,
    },
    FieldEntry {
        kind: FieldKind::Milestone,
        handler: parse_milestone,
    },
    FieldEntry {
        kind: FieldKind::State,
        handler: parse_state,
    },
];

/// `FIELD_TABLE` is ordered like `FieldKind`.
fn handler_for(kind: FieldKind) -> FieldHandler {
    FIELD_TABLE[kind as usize].handler
}

fn parse_title(raw: &str) -> Result<Option<String>, FieldError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(FieldError::new(FieldKind::Title, "title is required"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(FieldError::new(
            FieldKind::Title,
            format!("title is longer than {MAX_TITLE_CHARS} characters"),
        ));
    }
    Ok(Some(title.to_string()))
}

fn parse_body(raw: &str) -> Result<Option<String>, FieldError> {
    let body = raw.trim_end();
    Ok((!body.trim().is_empty()).then(|| body.to_string()))
}

fn parse_labels(raw: &str) -> Result<Option<String>, FieldError> {
    let mut labels: Vec<&str> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if label.chars().count() > MAX_LABEL_CHARS {
            return Err(FieldError::new(
                FieldKind::Labels,
                format!("label '{label}' is longer than {MAX_LABEL_CHARS} characters"),
            ));
        }
        if !labels.iter().any(|l| l.eq_ignore_ascii_case(label)) {
            labels.push(label);
        }
    }
    Ok((!labels.is_empty()).then(|| labels.join(",")))
}

fn parse_assignee(raw: &str) -> Result<Option<String>, FieldError> {
    let name = raw.trim().trim_start_matches('@');
    if name.is_empty() {
        return Ok(None);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(FieldError::new(
            FieldKind::Assignee,
            format!("'{name}' is not a valid user name"),
        ));
    }
    Ok(Some(name.to_string()))
}

fn parse_milestone(raw: &str) -> Result<Option<String>, FieldError> {
    let milestone = raw.trim();
    Ok((!milestone.is_empty()).then(|| milestone.to_string()))
}

fn parse_state(raw: &str) -> Result<Option<String>, FieldError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "open" | "opened" | "reopen" => Ok(Some("open".to_string())),
        "closed" | "close" => Ok(Some("closed".to_string())),
        other => Err(FieldError::new(
            FieldKind::State,
            format!("unknown state '{other}', use open or closed"),
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormKind {
    Create,
    Edit,
    Comment,
}

impl FormKind {
    #[must_use]
    pub const fn fields(self) -> &'static [FieldKind] {
        match self {
            Self::Create => &[
                FieldKind::Title,
                FieldKind::Body,
                FieldKind::Labels,
                FieldKind::Assignee,
                FieldKind::Milestone,
            ],
            Self::Edit => &[
                FieldKind::Title,
                FieldKind::Body,
                FieldKind::Labels,
                FieldKind::Assignee,
                FieldKind::Milestone,
                FieldKind::State,
            ],
            Self::Comment => &[FieldKind::Body],
        }
    }

    /// Fields that must produce a value.
    #[must_use]
    pub const fn is_required(self, field: FieldKind) -> bool {
        matches!(
            (self, field),
            (Self::Create | Self::Edit, FieldKind::Title) | (Self::Comment, FieldKind::Body)
        )
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Create => "New issue",
            Self::Edit => "Edit issue",
            Self::Comment => "Comment",
        }
    }
}

#[derive(Clone)]
pub struct Field {
    pub kind: FieldKind,
    pub value: String,
    handler: FieldHandler,
}

impl std::fmt::Debug for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Field")
            .field("kind", &self.kind)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

impl Field {
    /// Run this field's handler over its current value.
    ///
    /// # Errors
    ///
    /// Returns the handler's [`FieldError`].
    pub fn parse(&self) -> Result<Option<String>, FieldError> {
        (self.handler)(&self.value)
    }
}

/// A form ready to be edited and submitted.
#[derive(Debug, Clone)]
pub struct IssueForm {
    pub kind: FormKind,
    /// Repository for creation; the issue for edits and comments.
    pub target: IssueKey,
    fields: Vec<Field>,
}

impl IssueForm {
    #[must_use]
    pub fn new(kind: FormKind, target: IssueKey) -> Self {
        let fields = kind
            .fields()
            .iter()
            .map(|&field| Field {
                kind: field,
                value: String::new(),
                handler: handler_for(field),
            })
            .collect();
        Self {
            kind,
            target,
            fields,
        }
    }

    #[must_use]
    pub fn create(repository: impl Into<String>) -> Self {
        Self::new(FormKind::Create, IssueKey::new(0, repository))
    }

    #[must_use]
    pub fn comment(key: IssueKey) -> Self {
        Self::new(FormKind::Comment, key)
    }

    /// Edit form prefilled from an item's listing metadata.
    #[must_use]
    pub fn edit(item: &Item) -> Self {
        let mut form = Self::new(FormKind::Edit, item.key.clone());
        form.set(FieldKind::Title, &item.title);
        form.set(FieldKind::Labels, &item.labels.join(", "));
        if let Some(state) = &item.state {
            form.set(FieldKind::State, state);
        }
        form
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    #[must_use]
    pub fn value(&self, kind: FieldKind) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.kind == kind)
            .map(|f| f.value.as_str())
    }

    /// Set a field's raw value. Returns `false` if the form has no such field.
    pub fn set(&mut self, kind: FieldKind, value: &str) -> bool {
        match self.fields.iter_mut().find(|f| f.kind == kind) {
            Some(field) => {
                field.value = value.to_string();
                true
            }
            None => false,
        }
    }

    /// Validate every field and produce url-encodable pairs.
    ///
    /// # Errors
    ///
    /// Returns every [`FieldError`] found, in field order.
    pub fn encode(&self) -> Result<Vec<(&'static str, String)>, Vec<FieldError>> {
        let mut pairs = Vec::new();
        let mut errors = Vec::new();
        for field in &self.fields {
            match field.parse() {
                Ok(Some(value)) => pairs.push((field.kind.name(), value)),
                Ok(None) if self.kind.is_required(field.kind) => errors.push(FieldError::new(
                    field.kind,
                    format!("{} is required", field.kind.name()),
                )),
                Ok(None) => {}
                Err(err) => errors.push(err),
            }
        }
        if errors.is_empty() {
            Ok(pairs)
        } else {
            Err(errors)
        }
    }
}

/// What a submission endpoint answered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResponse {
    /// Rendered issue content.
    Content(String),
    /// The form came back, usually with validation errors.
    Form { errors: Vec<String> },
}

/// Classify a submission answer by its leading content.
#[must_use]
pub fn classify_response(body: &str) -> SubmitResponse {
    let head = body.trim_start();
    let is_form = head
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<form"));
    if is_form {
        SubmitResponse::Form {
            errors: form_errors(body),
        }
    } else {
        SubmitResponse::Content(body.to_string())
    }
}

/// Text of every element whose class mentions `error`.
#[must_use]
pub fn form_errors(fragment: &str) -> Vec<String> {
    let lower = fragment.to_ascii_lowercase();
    let mut errors = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = lower[cursor..].find("class=\"") {
        let class_start = cursor + rel + "class=\"".len();
        let Some(class_len) = lower[class_start..].find('"') else {
            break;
        };
        let class = &lower[class_start..class_start + class_len];
        cursor = class_start + class_len;
        if !class.contains("error") {
            continue;
        }

        let Some(tag_start) = lower[..class_start].rfind('<') else {
            continue;
        };
        let tag_name: String = lower[tag_start + 1..]
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect();
        let Some(open_len) = lower[cursor..].find('>') else {
            break;
        };
        let inner_start = cursor + open_len + 1;
        let close = format!("</{tag_name}");
        let inner_end = lower[inner_start..]
            .find(&close)
            .map_or(lower.len(), |idx| inner_start + idx);

        errors.extend(strip_tags(&fragment[inner_start..inner_end]));
        cursor = inner_end;
    }
    errors
}

fn strip_tags(html: &str) -> Vec<String> {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push('\n');
            }
            '>' => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
