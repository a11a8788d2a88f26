//! Field-level validation of raw request bodies.
//!
//! Validators never stop at the first problem: every rule is checked and all
//! violations are returned in a stable order, so one response can list them all.

use serde_json::{Map, Value};

use crate::constants::auth::MIN_PASSWORD_LEN;
use crate::constants::limits::{
    CATEGORY_MAX, EMAIL_MAX, PRODUCT_NAME_MAX, USERNAME_MAX, USERNAME_MIN,
};
use crate::entities::users::Role;

/// Raw JSON object as received from a client.
pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// A field counts as provided when present and neither null nor an empty string.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Parses a price from a JSON number or a numeric string.
pub(crate) fn parse_price(value: &Value) -> Option<f64> {
    let price = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    price.is_finite().then_some(price)
}

/// Parses a quantity from an integral JSON number or an integer string.
pub(crate) fn parse_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn validate_user(fields: &Fields, mode: Mode) -> Vec<String> {
    let mut errors = Vec::new();

    if mode == Mode::Create {
        if is_blank(fields.get("username")) {
            errors.push("Username is required".to_string());
        }
        if is_blank(fields.get("email")) {
            errors.push("Email is required".to_string());
        }
    }

    match fields.get("username") {
        Some(Value::String(username)) if mode == Mode::Update || !username.is_empty() => {
            let len = char_len(username);
            if len < USERNAME_MIN {
                errors.push(format!(
                    "Username must be at least {USERNAME_MIN} characters"
                ));
            }
            if len > USERNAME_MAX {
                errors.push(format!("Username must not exceed {USERNAME_MAX} characters"));
            }
        }
        Some(Value::String(_)) | None => {}
        Some(Value::Null) if mode == Mode::Create => {}
        Some(_) => errors.push("Username must be a string".to_string()),
    }

    match fields.get("email") {
        Some(Value::String(email)) if mode == Mode::Update || !email.is_empty() => {
            if !email.contains('@') || !email.contains('.') {
                errors.push("Invalid email format".to_string());
            }
            if char_len(email) > EMAIL_MAX {
                errors.push(format!("Email must not exceed {EMAIL_MAX} characters"));
            }
        }
        Some(Value::String(_)) | None => {}
        Some(Value::Null) if mode == Mode::Create => {}
        Some(_) => errors.push("Email must be a string".to_string()),
    }

    match fields.get("password") {
        None | Some(Value::Null) => {}
        Some(Value::String(password)) => {
            if char_len(password) < MIN_PASSWORD_LEN {
                errors.push(format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters"
                ));
            }
        }
        Some(_) => errors.push("Password must be a string".to_string()),
    }

    match fields.get("role") {
        None => {}
        Some(Value::String(role)) if Role::parse(role).is_some() => {}
        Some(_) => errors.push("Role must be one of: user, admin".to_string()),
    }

    match fields.get("is_active") {
        None | Some(Value::Bool(_)) => {}
        Some(_) => errors.push("is_active must be a boolean".to_string()),
    }

    errors
}

/// Self-registration: the create rules plus a mandatory password.
pub fn validate_registration(fields: &Fields) -> Vec<String> {
    let mut errors = validate_user(fields, Mode::Create);
    if is_blank(fields.get("password")) {
        errors.push("Password is required".to_string());
    }
    errors
}

pub fn validate_product(fields: &Fields, mode: Mode) -> Vec<String> {
    let mut errors = Vec::new();

    if mode == Mode::Create {
        if is_blank(fields.get("name")) {
            errors.push("Product name is required".to_string());
        }
        if !fields.contains_key("price") {
            errors.push("Price is required".to_string());
        }
    }

    match fields.get("name") {
        Some(Value::String(name)) => {
            if mode == Mode::Update && name.trim().is_empty() {
                errors.push("Product name cannot be empty".to_string());
            }
            if char_len(name) > PRODUCT_NAME_MAX {
                errors.push(format!(
                    "Product name must not exceed {PRODUCT_NAME_MAX} characters"
                ));
            }
        }
        None => {}
        Some(Value::Null) if mode == Mode::Create => {}
        Some(_) => errors.push("Product name must be a string".to_string()),
    }

    if let Some(price) = fields.get("price") {
        match parse_price(price) {
            Some(p) if p < 0.0 => errors.push("Price must be a positive number".to_string()),
            Some(_) => {}
            None => errors.push("Price must be a valid number".to_string()),
        }
    }

    if let Some(quantity) = fields.get("quantity") {
        match parse_quantity(quantity) {
            Some(q) if q < 0 => {
                errors.push("Quantity must be a non-negative integer".to_string());
            }
            Some(q) if i32::try_from(q).is_err() => {
                errors.push("Quantity is too large".to_string());
            }
            Some(_) => {}
            None => errors.push("Quantity must be a valid integer".to_string()),
        }
    }

    match fields.get("category") {
        None | Some(Value::Null) => {}
        Some(Value::String(category)) => {
            if char_len(category) > CATEGORY_MAX {
                errors.push(format!("Category must not exceed {CATEGORY_MAX} characters"));
            }
        }
        Some(_) => errors.push("Category must be a string".to_string()),
    }

    match fields.get("description") {
        None | Some(Value::Null | Value::String(_)) => {}
        Some(_) => errors.push("Description must be a string".to_string()),
    }

    match fields.get("is_available") {
        None | Some(Value::Bool(_)) => {}
        Some(_) => errors.push("is_available must be a boolean".to_string()),
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_user_create_requires_username_and_email() {
        let errors = validate_user(&fields(json!({})), Mode::Create);
        assert_eq!(errors, vec!["Username is required", "Email is required"]);

        let errors = validate_user(&fields(json!({"username": "", "email": null})), Mode::Create);
        assert_eq!(errors, vec!["Username is required", "Email is required"]);
    }

    #[test]
    fn test_user_collects_every_violation() {
        let errors = validate_user(
            &fields(json!({
                "username": "ab",
                "email": "not-an-email",
                "password": "123",
                "role": "superuser",
                "is_active": "yes"
            })),
            Mode::Create,
        );
        assert_eq!(
            errors,
            vec![
                "Username must be at least 3 characters",
                "Invalid email format",
                "Password must be at least 6 characters",
                "Role must be one of: user, admin",
                "is_active must be a boolean",
            ]
        );
    }

    #[test]
    fn test_user_length_limits() {
        let long_name = "a".repeat(81);
        let long_email = format!("{}@example.com", "a".repeat(110));
        let errors = validate_user(
            &fields(json!({"username": long_name, "email": long_email})),
            Mode::Create,
        );
        assert_eq!(
            errors,
            vec![
                "Username must not exceed 80 characters",
                "Email must not exceed 120 characters",
            ]
        );

        let ok = validate_user(
            &fields(json!({"username": "a".repeat(80), "email": "a@b.co"})),
            Mode::Create,
        );
        assert!(ok.is_empty());
    }

    #[test]
    fn test_user_update_only_checks_present_fields() {
        assert!(validate_user(&fields(json!({})), Mode::Update).is_empty());
        assert!(validate_user(&fields(json!({"role": "admin"})), Mode::Update).is_empty());

        let errors = validate_user(&fields(json!({"username": ""})), Mode::Update);
        assert_eq!(errors, vec!["Username must be at least 3 characters"]);
    }

    #[test]
    fn test_registration_requires_password() {
        let errors = validate_registration(&fields(json!({
            "username": "newuser",
            "email": "new@example.com"
        })));
        assert_eq!(errors, vec!["Password is required"]);
    }

    #[test]
    fn test_product_create_requires_name_and_price() {
        let errors = validate_product(&fields(json!({"description": "x"})), Mode::Create);
        assert_eq!(errors, vec!["Product name is required", "Price is required"]);
    }

    #[test]
    fn test_product_numeric_rules() {
        let errors = validate_product(
            &fields(json!({"name": "Widget", "price": -1, "quantity": -3})),
            Mode::Create,
        );
        assert_eq!(
            errors,
            vec![
                "Price must be a positive number",
                "Quantity must be a non-negative integer",
            ]
        );

        let errors = validate_product(
            &fields(json!({"price": "abc", "quantity": "1.5"})),
            Mode::Update,
        );
        assert_eq!(
            errors,
            vec!["Price must be a valid number", "Quantity must be a valid integer"]
        );

        assert!(
            validate_product(
                &fields(json!({"name": "Widget", "price": "12.50", "quantity": "4"})),
                Mode::Create
            )
            .is_empty()
        );
        assert!(validate_product(&fields(json!({"price": 0})), Mode::Update).is_empty());
    }

    #[test]
    fn test_product_text_limits() {
        let errors = validate_product(
            &fields(json!({
                "name": "n".repeat(101),
                "price": 1.0,
                "category": "c".repeat(51),
                "is_available": 1
            })),
            Mode::Create,
        );
        assert_eq!(
            errors,
            vec![
                "Product name must not exceed 100 characters",
                "Category must not exceed 50 characters",
                "is_available must be a boolean",
            ]
        );
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_price(&json!(10)), Some(10.0));
        assert_eq!(parse_price(&json!(" 3.5 ")), Some(3.5));
        assert_eq!(parse_price(&json!(true)), None);
        assert_eq!(parse_quantity(&json!(7)), Some(7));
        assert_eq!(parse_quantity(&json!(7.0)), Some(7));
        assert_eq!(parse_quantity(&json!(7.25)), None);
        assert_eq!(parse_quantity(&json!("12")), Some(12));
    }
}
