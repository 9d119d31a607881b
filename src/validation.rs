//! Input validation for wave snapshots.
//!
//! Checks structural integrity of the orders, resources, and catalog
//! data handed to one scheduling run. Detects:
//! - Duplicate IDs (orders, workers, equipment, SKUs, bins)
//! - Items with a zero quantity
//! - Items referencing an unknown SKU
//!
//! Findings are reported, not enforced: the engine logs them and
//! schedules anyway (a wave never fails outright on data quality),
//! while callers wanting a stricter policy can reject on `Err`.

use std::collections::{HashMap, HashSet};

use crate::models::{Bin, Equipment, Order, Sku, Worker};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation finding.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Finding category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities of the same family share an ID.
    DuplicateId,
    /// An order item references a SKU missing from the catalog.
    UnknownSku,
    /// An order item carries a zero quantity.
    ZeroQuantity,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates one wave's input snapshots.
///
/// Checks:
/// 1. No duplicate order IDs
/// 2. No duplicate worker IDs
/// 3. No duplicate equipment IDs
/// 4. No duplicate bin IDs
/// 5. All item quantities are positive
/// 6. All item SKU references resolve against the catalog
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(findings)` with every detected
/// issue.
pub fn validate_wave(
    orders: &[Order],
    workers: &[Worker],
    equipment: &[Equipment],
    skus: &HashMap<String, Sku>,
    bins: &[Bin],
) -> ValidationResult {
    let mut errors = Vec::new();

    check_duplicates(orders.iter().map(|o| o.id.as_str()), "order", &mut errors);
    check_duplicates(workers.iter().map(|w| w.id.as_str()), "worker", &mut errors);
    check_duplicates(
        equipment.iter().map(|e| e.id.as_str()),
        "equipment",
        &mut errors,
    );
    check_duplicates(bins.iter().map(|b| b.id.as_str()), "bin", &mut errors);

    for order in orders {
        for item in &order.items {
            if item.quantity == 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ZeroQuantity,
                    format!("Order '{}' has a zero-quantity item for SKU '{}'", order.id, item.sku_id),
                ));
            }
            if !skus.contains_key(&item.sku_id) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownSku,
                    format!("Order '{}' references unknown SKU '{}'", order.id, item.sku_id),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_duplicates<'a>(
    ids: impl Iterator<Item = &'a str>,
    family: &str,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate {family} ID: {id}"),
            ));
        }
    }
}
