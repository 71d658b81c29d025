//! Input validation for API requests.
//!
//! Field checks return `Result<(), String>` with a human-readable message;
//! request-level validators collect them with `ValidationErrorBuilder` from the
//! `error` module so that every failing field is reported at once.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ApiError, ValidationErrorBuilder};
use crate::config::LimitsConfig;
use crate::db::{CreateIngredientRequest, CreateTagRequest, CreateUserRequest};

/// Upper bound shared by cooking time and ingredient amounts
pub const MAX_SMALL_INT: i64 = 32767;

/// Usernames reserved by the router
const RESERVED_USERNAMES: [&str; 1] = ["me"];

lazy_static! {
    /// Regex for tag colors (`#RGB` or `#RRGGBB`)
    static ref HEX_COLOR_REGEX: Regex = Regex::new(
        r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$"
    ).unwrap();

    /// Regex for tag slugs
    static ref SLUG_REGEX: Regex = Regex::new(
        r"^[-a-zA-Z0-9_]+$"
    ).unwrap();

    /// Regex for usernames (letters, digits and `.@+-_`)
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[\w.@+-]+$"
    ).unwrap();
}

/// Validate a required text field against a character limit
pub fn validate_text(value: &str, label: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }

    if value.chars().count() > max {
        return Err(format!("{} is too long (max {} characters)", label, max));
    }

    Ok(())
}

/// Validate a tag color
pub fn validate_hex_color(color: &str) -> Result<(), String> {
    if color.is_empty() {
        return Err("Color is required".to_string());
    }

    if !HEX_COLOR_REGEX.is_match(color) {
        return Err("Color must be a hex code such as #49B64E".to_string());
    }

    Ok(())
}

/// Validate a tag slug
pub fn validate_slug(slug: &str, max: usize) -> Result<(), String> {
    validate_text(slug, "Slug", max)?;

    if !SLUG_REGEX.is_match(slug) {
        return Err("Slug may only contain letters, digits, dashes and underscores".to_string());
    }

    Ok(())
}

fn validate_small_positive(value: i64, label: &str) -> Result<(), String> {
    if !(1..=MAX_SMALL_INT).contains(&value) {
        return Err(format!("{} must be between 1 and {}", label, MAX_SMALL_INT));
    }
    Ok(())
}

/// Validate a cooking time in minutes
pub fn validate_cooking_time(minutes: i64) -> Result<(), String> {
    validate_small_positive(minutes, "Cooking time")
}

/// Validate an ingredient amount
pub fn validate_amount(amount: i64) -> Result<(), String> {
    validate_small_positive(amount, "Amount")
}

/// Validate an email address
pub fn validate_email(email: &str, max: usize) -> Result<(), String> {
    validate_text(email, "Email", max)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("Invalid email format".to_string()),
    }
}

/// Validate a username
pub fn validate_username(username: &str, max: usize) -> Result<(), String> {
    validate_text(username, "Username", max)?;

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username may only contain letters, digits and the characters . @ + - _".to_string(),
        );
    }

    if RESERVED_USERNAMES.contains(&username) {
        return Err(format!("Username '{}' is reserved", username));
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    Ok(())
}

/// Validate a registration payload (uniqueness is checked separately)
pub fn validate_user(req: &CreateUserRequest, limits: &LimitsConfig) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_email(&req.email, limits.email_max_length) {
        errors.add("email", e);
    }
    if let Err(e) = validate_username(&req.username, limits.user_name_max_length) {
        errors.add("username", e);
    }
    if let Err(e) = validate_text(&req.first_name, "First name", limits.user_name_max_length) {
        errors.add("first_name", e);
    }
    if let Err(e) = validate_text(&req.last_name, "Last name", limits.user_name_max_length) {
        errors.add("last_name", e);
    }
    if let Err(e) = validate_password(&req.password) {
        errors.add("password", e);
    }

    errors.finish()
}

/// Validate a new tag
pub fn validate_tag(req: &CreateTagRequest, limits: &LimitsConfig) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_text(&req.name, "Name", limits.name_max_length) {
        errors.add("name", e);
    }
    if let Err(e) = validate_slug(&req.slug, limits.slug_max_length) {
        errors.add("slug", e);
    }
    if let Err(e) = validate_hex_color(&req.color) {
        errors.add("color", e);
    }

    errors.finish()
}

/// Validate a new ingredient
pub fn validate_ingredient(
    req: &CreateIngredientRequest,
    limits: &LimitsConfig,
) -> Result<(), ApiError> {
    let mut errors = ValidationErrorBuilder::new();

    if let Err(e) = validate_text(&req.name, "Name", limits.name_max_length) {
        errors.add("name", e);
    }
    if let Err(e) = validate_text(&req.measurement_unit, "Measurement unit", limits.name_max_length) {
        errors.add("measurement_unit", e);
    }

    errors.finish()
}
