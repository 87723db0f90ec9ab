use crate::error::AppError;

/// Longest accepted settings key, in bytes.
pub const MAX_KEY_LEN: usize = 255;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

pub fn require_valid_key(key: &str) -> Result<(), AppError> {
    require_non_empty("key", key)?;
    if key.len() > MAX_KEY_LEN {
        return Err(AppError::Validation(format!(
            "key must be at most {MAX_KEY_LEN} bytes"
        )));
    }
    Ok(())
}
