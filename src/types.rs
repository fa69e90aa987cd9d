use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::policy::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Sweet,
    Romantic,
    Poetic,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Sweet, Category::Romantic, Category::Poetic];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Sweet => "sweet",
            Category::Romantic => "romantic",
            Category::Poetic => "poetic",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == value)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl MessageLength {
    pub const ALL: [MessageLength; 3] =
        [MessageLength::Short, MessageLength::Medium, MessageLength::Long];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageLength::Short => "short",
            MessageLength::Medium => "medium",
            MessageLength::Long => "long",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == value)
    }
}

impl fmt::Display for MessageLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four knobs both generators understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationOptions {
    pub category: Category,
    pub include_emojis: bool,
    pub include_weather: bool,
    pub message_length: MessageLength,
}

impl GenerationOptions {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            include_emojis: true,
            include_weather: false,
            message_length: MessageLength::default(),
        }
    }
}

/// A single violated field in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Flattens validator output into field errors, ordered by field name.
pub fn field_errors(errors: ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = camel_case(&field.to_string());
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                FieldError::new(field.clone(), message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn rejected(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

fn enum_error(value: &str, allowed: &[&str]) -> ValidationError {
    if value.is_empty() {
        return rejected("required", "Required".to_string());
    }
    let expected = allowed
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(" | ");
    rejected(
        "invalid_enum_value",
        format!("Invalid enum value. Expected {}, received '{}'", expected, value),
    )
}

fn validate_category(value: &str) -> Result<(), ValidationError> {
    match Category::parse(value) {
        Some(_) => Ok(()),
        None => Err(enum_error(value, &Category::ALL.map(Category::as_str))),
    }
}

fn validate_message_length(value: &str) -> Result<(), ValidationError> {
    match MessageLength::parse(value) {
        Some(_) => Ok(()),
        None => Err(enum_error(value, &MessageLength::ALL.map(MessageLength::as_str))),
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().to_string())
}

fn default_true() -> bool {
    true
}

fn default_message_length() -> String {
    MessageLength::default().as_str().to_string()
}

/// Body of `POST /api/generate-message`. Missing fields deserialize to
/// empty values so they surface as field errors rather than a parse failure.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMessageBody {
    #[serde(default)]
    #[validate(custom(function = "validate_category"))]
    pub category: String,
    #[serde(default = "default_true")]
    pub include_emojis: bool,
    #[serde(default)]
    pub include_weather: bool,
    #[serde(default = "default_message_length")]
    #[validate(custom(function = "validate_message_length"))]
    pub message_length: String,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub options: GenerationOptions,
    pub phone_number: String,
}

impl TryFrom<GenerateMessageBody> for GenerateRequest {
    type Error = Vec<FieldError>;

    fn try_from(body: GenerateMessageBody) -> Result<Self, Self::Error> {
        body.validate().map_err(field_errors)?;

        let category = Category::parse(&body.category)
            .ok_or_else(|| vec![FieldError::new("category", "Required")])?;
        let message_length = MessageLength::parse(&body.message_length)
            .ok_or_else(|| vec![FieldError::new("messageLength", "Required")])?;

        Ok(Self {
            options: GenerationOptions {
                category,
                include_emojis: body.include_emojis,
                include_weather: body.include_weather,
                message_length,
            },
            phone_number: body.phone_number,
        })
    }
}

/// Body of `POST /api/save-number`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveNumberRequest {
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, message = "Phone number is required"))]
    pub phone_number: String,
    #[serde(default)]
    pub contact_name: Option<String>,
}

impl SaveNumberRequest {
    pub fn validated(self) -> Result<Self, Vec<FieldError>> {
        self.validate().map_err(field_errors)?;
        Ok(self)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub message: String,
    pub category: Category,
    pub provider: Provider,
    pub sms_url: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub remote_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generate(body: serde_json::Value) -> Result<GenerateRequest, Vec<FieldError>> {
        let body: GenerateMessageBody = serde_json::from_value(body).unwrap();
        GenerateRequest::try_from(body)
    }

    fn save(body: serde_json::Value) -> Result<SaveNumberRequest, Vec<FieldError>> {
        serde_json::from_value::<SaveNumberRequest>(body)
            .unwrap()
            .validated()
    }

    #[test]
    fn generate_request_applies_defaults() {
        let req = generate(json!({
            "category": "poetic",
            "phoneNumber": "+15551234567"
        }))
        .unwrap();

        assert_eq!(req.options.category, Category::Poetic);
        assert!(req.options.include_emojis);
        assert!(!req.options.include_weather);
        assert_eq!(req.options.message_length, MessageLength::Medium);
        assert_eq!(req.phone_number, "+15551234567");
    }

    #[test]
    fn generate_request_rejects_unknown_category() {
        let errors = generate(json!({
            "category": "angry",
            "includeEmojis": true,
            "includeWeather": false,
            "messageLength": "short",
            "phoneNumber": "x"
        }))
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "category");
        assert_eq!(
            errors[0].message,
            "Invalid enum value. Expected 'sweet' | 'romantic' | 'poetic', received 'angry'"
        );
    }

    #[test]
    fn generate_request_collects_every_violation() {
        let errors = generate(json!({
            "messageLength": "epic",
            "phoneNumber": "   "
        }))
        .unwrap_err();

        assert_eq!(
            errors,
            vec![
                FieldError::new("category", "Required"),
                FieldError::new(
                    "messageLength",
                    "Invalid enum value. Expected 'short' | 'medium' | 'long', received 'epic'"
                ),
                FieldError::new("phoneNumber", "Phone number is required"),
            ]
        );
    }

    #[test]
    fn mistyped_fields_fail_to_deserialize() {
        assert!(serde_json::from_value::<GenerateMessageBody>(json!({
            "category": "sweet",
            "includeEmojis": "yes",
            "phoneNumber": "x"
        }))
        .is_err());
        assert!(serde_json::from_value::<GenerateMessageBody>(json!(["sweet"])).is_err());
    }

    #[test]
    fn save_request_accepts_null_contact_name() {
        let req = save(json!({
            "phoneNumber": " +15551234567 ",
            "contactName": null
        }))
        .unwrap();
        assert_eq!(req.phone_number, "+15551234567");
        assert_eq!(req.contact_name, None);
    }

    #[test]
    fn save_request_requires_phone_number() {
        let errors = save(json!({ "contactName": "Sam" })).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("phoneNumber", "Phone number is required")]
        );
    }

    #[test]
    fn field_names_are_camel_cased() {
        assert_eq!(camel_case("message_length"), "messageLength");
        assert_eq!(camel_case("phoneNumber"), "phoneNumber");
    }
}
