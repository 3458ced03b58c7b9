use crate::model::{apperror::ValidationError, models::ValidatedInput};

/**
 * Checks the billing form before anything is calculated or stored.
 *
 * #Arguments
 * `name`: Customer name as typed. Surrounding whitespace is ignored.
 * `units_text`: Units consumed as typed. Surrounding whitespace is ignored, everything else must be decimal digits.
 *
 * #Returns
 * The trimmed name and parsed units, or the first `ValidationError` found.
 */
pub fn validate(name: &str, units_text: &str) -> Result<ValidatedInput, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let units_text = units_text.trim();
    if units_text.is_empty() || !units_text.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::NotANumber);
    }
    // Digits that do not fit in an i64 are not a usable number either.
    let units: i64 = units_text.parse().map_err(|_| ValidationError::NotANumber)?;
    // Unreachable while only digits are accepted.
    if units < 0 {
        return Err(ValidationError::NegativeUnits);
    }
    Ok(ValidatedInput { name: name.to_string(), units })
}
