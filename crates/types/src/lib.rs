//! # Pacientes Types
//!
//! Validated primitive types shared across the pacientes workspace.
//!
//! These types enforce the field-level constraints of the patient record at
//! construction time, so that downstream code (repository, handlers) never
//! has to re-check them:
//! - [`NonEmptyText`] — trimmed, non-empty text with an optional length bound
//! - [`Age`] — an integer age within the accepted human range
//!
//! **No API or storage concerns**: these are plain data types. How they are
//! persisted or serialised over the wire belongs in `pacientes-core` and
//! `api-rest`.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The trimmed input exceeded the allowed number of characters
    #[error("text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is automatically trimmed of leading
/// and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty or contains
    /// only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a new `NonEmptyText` with an upper bound on its length.
    ///
    /// The input is trimmed first; the bound applies to the number of
    /// characters remaining after the trim.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if the trimmed input is empty, or
    /// `TextError::TooLong` if it exceeds `max` characters.
    pub fn with_max_len(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns the inner `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors that can occur when creating an [`Age`].
#[derive(Debug, thiserror::Error)]
pub enum AgeError {
    /// The value was below zero
    #[error("age cannot be negative")]
    Negative,
    /// The value exceeded the accepted maximum
    #[error("age cannot be greater than {}", Age::MAX)]
    TooLarge,
}

/// An integer age guaranteed to lie within the accepted human range.
///
/// Valid ages are whole numbers from 0 to [`Age::MAX`] inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Age(u8);

impl Age {
    /// The oldest accepted age.
    pub const MAX: u8 = 120;

    /// Creates a new `Age` from a raw integer.
    ///
    /// # Errors
    ///
    /// Returns `AgeError::Negative` for values below zero and
    /// `AgeError::TooLarge` for values above [`Age::MAX`].
    pub fn new(value: i64) -> Result<Self, AgeError> {
        if value < 0 {
            return Err(AgeError::Negative);
        }
        if value > i64::from(Self::MAX) {
            return Err(AgeError::TooLarge);
        }
        // Bounds checked above, the cast cannot truncate.
        Ok(Self(value as u8))
    }

    /// Returns the age as a plain integer.
    pub fn get(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for Age {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Age {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        Age::new(value).map_err(serde::de::Error::custom)
    }
}
