//! Conversation flow states and the input validators used at each step.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Number of digits in a one-time code
pub const OTP_LENGTH: usize = 6;

/// Minimum length of a phone number, `+` included
pub const MIN_PHONE_LENGTH: usize = 10;

/// A user's in-progress multi-step flow. A user without a flow has no record
/// at all in the conversation store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Flow {
    AwaitingPhone,
    AwaitingOtp {
        phone: String,
        otp: String,
    },
    AddingProduct(ProductDraft),
    EditingProduct {
        product_id: i64,
        step: EditStep,
    },
    DeletingProduct {
        product_id: i64,
    },
    AddingNews,
}

impl Flow {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Flow::AwaitingPhone => "awaiting_phone",
            Flow::AwaitingOtp { .. } => "awaiting_otp",
            Flow::AddingProduct(_) => "adding_product",
            Flow::EditingProduct { .. } => "editing_product",
            Flow::DeletingProduct { .. } => "deleting_product",
            Flow::AddingNews => "adding_news",
        }
    }
}

/// Product creation progress; each step holds what was entered so far
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProductDraft {
    Name,
    Price {
        name: String,
    },
    Description {
        name: String,
        price: f64,
    },
    Media {
        name: String,
        price: f64,
        description: String,
    },
}

/// Product editing progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EditStep {
    Field,
    Value { field: EditField },
}

/// Editable product fields
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditField {
    Name,
    Price,
    Description,
    Image,
    Video,
}

impl EditField {
    pub const ALL: [EditField; 5] = [
        EditField::Name,
        EditField::Price,
        EditField::Description,
        EditField::Image,
        EditField::Video,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EditField::Name => "name",
            EditField::Price => "price",
            EditField::Description => "description",
            EditField::Image => "image",
            EditField::Video => "video",
        }
    }

    /// Image and video accept an attachment as well as a text reference
    pub fn is_media(self) -> bool {
        matches!(self, EditField::Image | EditField::Video)
    }
}

impl fmt::Display for EditField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EditField {
    type Err = ValidationError;

    /// Field names are matched exactly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

/// Validates a phone number: leading `+` and at least ten characters
pub fn validate_phone(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.starts_with('+') && trimmed.chars().count() >= MIN_PHONE_LENGTH {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::PhoneFormat)
    }
}

/// Exact comparison of a submitted code against the issued one
pub fn check_otp(submitted: &str, expected: &str) -> Result<(), ValidationError> {
    if submitted == expected {
        Ok(())
    } else {
        Err(ValidationError::OtpMismatch)
    }
}

/// Parses a non-negative, finite price
pub fn parse_price(input: &str) -> Result<f64, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => Ok(price),
        _ => Err(ValidationError::Price(trimmed.to_string())),
    }
}

/// Parses a product id typed by the administrator
pub fn parse_product_id(input: &str) -> Result<i64, ValidationError> {
    let trimmed = input.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::ProductId(trimmed.to_string()))
}

/// `skip` in any letter case ends the media step without media
pub fn is_skip(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case("skip")
}

/// Random numeric one-time code of [`OTP_LENGTH`] digits
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
