use super::ApiError;

pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Query cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_target(target: &str) -> Result<&str, ApiError> {
    let trimmed = target.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Target cannot be empty"));
    }
    Ok(trimmed)
}

pub fn validate_record_id(id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid analysis ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(id)
}
