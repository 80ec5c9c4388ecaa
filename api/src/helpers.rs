use crate::error::ApiError;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Document};
use std::str::FromStr;

/// Parses a numeric form field, naming the field in the error.
pub(crate) fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T, ApiError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a number, got `{value}`")))
}

/// Parses a Postgres primary key.
pub(crate) fn parse_pg_id(field: &str, value: &str) -> Result<i32, ApiError> {
    parse_number::<i32>(field, value)
}

/// Parses a hex-encoded Mongo object id.
pub(crate) fn parse_object_id(field: &str, value: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("{field} is not a valid object id: `{value}`")))
}

/// `LIKE` pattern matching `term` anywhere in the column. `%`, `_` and `\`
/// in the term match literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Mongo filter matching project names that contain `term` literally.
pub(crate) fn name_contains(term: &str) -> Document {
    doc! { "name": { "$regex": regex::escape(term) } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_trimmed_before_parsing() {
        assert_eq!(parse_number::<i64>("start_date", " 1700000000 ").unwrap(), 1_700_000_000);
        assert_eq!(parse_pg_id("id", "42").unwrap(), 42);
    }

    #[test]
    fn bad_numbers_name_the_field() {
        let err = parse_number::<i32>("sprint_duration", "fourteen").unwrap_err();
        assert!(matches!(&err, ApiError::BadRequest(msg) if msg.contains("sprint_duration")));
        assert!(parse_pg_id("id", "").is_err());
    }

    #[test]
    fn object_ids_round_trip_through_hex() {
        let oid = ObjectId::new();
        assert_eq!(parse_object_id("id", &oid.to_hex()).unwrap(), oid);
        assert!(matches!(
            parse_object_id("owner_id", "not-an-id"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("alpha"), "%alpha%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern(""), "%%");
    }

    #[test]
    fn name_filter_escapes_regex_metacharacters() {
        let filter = name_contains("a.b*");
        let regex = filter
            .get_document("name")
            .unwrap()
            .get_str("$regex")
            .unwrap();
        assert_eq!(regex, "a\\.b\\*");
    }
}
