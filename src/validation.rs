//! Product field validation
//!
//! Turns the raw text fields of a create request into a typed draft, or a
//! list of field errors. Runs before anything is uploaded or written.

use crate::models::{Category, NewProduct, StoredImage};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use validator::Validate;

/// Raw text fields as submitted in the multipart form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub is_featured: Option<String>,
}

impl ProductFields {
    /// Record a form field by its wire name. Unknown names are ignored.
    pub fn set(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            "name" => &mut self.name,
            "description" => &mut self.description,
            "price" => &mut self.price,
            "category" => &mut self.category,
            "isFeatured" => &mut self.is_featured,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Typed product fields that passed validation, still without an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub is_featured: bool,
}

/// Length and range rules. Fields that are missing or failed to parse are
/// `None` and skipped, so the rules still run on everything else.
#[derive(Debug, Validate)]
struct FieldRules<'a> {
    #[validate(length(min = 1, message = "Product name is required"))]
    name: Option<&'a str>,
    #[validate(length(min = 1, message = "Product description is required"))]
    description: Option<&'a str>,
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    price: Option<f64>,
}

impl ProductDraft {
    pub fn with_image(self, image: StoredImage) -> NewProduct {
        NewProduct {
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            is_featured: self.is_featured,
            image,
        }
    }
}

/// Only the literal text `"true"` enables the flag.
pub fn parse_featured(value: Option<&str>) -> bool {
    value == Some("true")
}

fn required<'a>(
    value: Option<&'a str>,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    if value.is_none() {
        errors.push(FieldError::new(field, format!("Path `{}` is required", field)));
    }
    value
}

fn parse_price(raw: &str) -> Result<f64, String> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("Cast to Number failed for value \"{}\"", raw))?;
    if !price.is_finite() {
        return Err(format!("Cast to Number failed for value \"{}\"", raw));
    }
    Ok(price)
}

fn parse_category(raw: &str) -> Result<Category, String> {
    Category::from_str(raw).map_err(|_| {
        let allowed: Vec<String> = Category::iter().map(|c| c.to_string()).collect();
        format!(
            "`{}` is not a valid category (expected one of: {})",
            raw,
            allowed.join(", ")
        )
    })
}

/// Validate raw form fields into a [`ProductDraft`].
///
/// Every problem is reported, not just the first. Field errors are ordered
/// by field name so the result is deterministic.
pub fn validate_product(fields: &ProductFields) -> Result<ProductDraft, ValidationErrors> {
    let mut errors = Vec::new();

    let name = required(fields.name.as_deref(), "name", &mut errors).map(str::trim);
    let description = required(fields.description.as_deref(), "description", &mut errors);

    let price = required(fields.price.as_deref(), "price", &mut errors).and_then(|raw| {
        parse_price(raw)
            .map_err(|message| errors.push(FieldError::new("price", message)))
            .ok()
    });

    let category = required(fields.category.as_deref(), "category", &mut errors).and_then(|raw| {
        parse_category(raw)
            .map_err(|message| errors.push(FieldError::new("category", message)))
            .ok()
    });

    let rules = FieldRules {
        name,
        description,
        price,
    };
    if let Err(rule_errors) = rules.validate() {
        for (field, field_errors) in rule_errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                errors.push(FieldError::new(&field.to_string(), message));
            }
        }
    }

    if errors.is_empty() {
        if let (Some(name), Some(description), Some(price), Some(category)) =
            (name, description, price, category)
        {
            return Ok(ProductDraft {
                name: name.to_string(),
                description: description.to_string(),
                price,
                category,
                is_featured: parse_featured(fields.is_featured.as_deref()),
            });
        }
    }

    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(ValidationErrors(errors))
}
