//! Column names for the live response sheet and the historical flat file,
//! plus the Arrow schema the historical file is written with.

/// Columns of the live form-response sheet.
pub mod live {
    pub const TIMESTAMP: &str = "Timestamp";
    pub const TOPIC_TEXT: &str = "Question 11";
    pub const REMARKS: &str = "REMARKS";
    pub const SESSION: &str = "session_name";

    pub const REQUIRED: &[&str] = &[TIMESTAMP, TOPIC_TEXT, REMARKS];
}

/// Columns of the pre-classified historical dataset.
pub mod history {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const TIMESTAMP: &str = "TIMESTAMP";
    pub const REMARKS: &str = "REMARKS";
    pub const TOPIC_ID: &str = "topic";
    pub const TOPIC_GROUP: &str = "topic_group";
    pub const SENTIMENT: &str = "sentiment";
    pub const SENTIMENT_SCORE: &str = "sentiment_score";
    pub const SESSION: &str = "session_name";

    pub const REQUIRED: &[&str] = &[TIMESTAMP, TOPIC_GROUP, SENTIMENT];

    /// Schema used when appending classified records to the flat file.
    ///
    /// The timestamp is written as text (`YYYY-MM-DD HH:MM:SS`) so the file
    /// stays readable by spreadsheet tools.
    pub fn history_schema() -> Schema {
        Schema::new(vec![
            Field::new(TIMESTAMP, DataType::Utf8, false),
            Field::new(REMARKS, DataType::Utf8, false),
            Field::new(TOPIC_ID, DataType::Int64, true),
            Field::new(TOPIC_GROUP, DataType::Utf8, false),
            Field::new(SENTIMENT, DataType::Utf8, false),
            Field::new(SENTIMENT_SCORE, DataType::Float64, true),
            Field::new(SESSION, DataType::Utf8, true),
        ])
    }
}

/// Names from `required` that are not in `present`, in `required` order.
pub fn missing_columns<'a, I>(present: I, required: &[&str]) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let present: Vec<&str> = present.into_iter().collect();
    required
        .iter()
        .filter(|name| !present.contains(name))
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_schema_has_expected_fields() {
        let schema = history::history_schema();
        assert_eq!(schema.fields().len(), 7);
        for name in history::REQUIRED {
            assert!(schema.field_with_name(name).is_ok(), "{name}");
        }
        assert!(schema.field_with_name(history::SENTIMENT_SCORE).unwrap().is_nullable());
    }

    #[test]
    fn missing_columns_reports_in_required_order() {
        let present = ["TIMESTAMP", "REMARKS", "topic_group"];
        assert_eq!(
            missing_columns(present, history::REQUIRED),
            vec!["sentiment".to_string()]
        );
        assert!(missing_columns(["Timestamp", "Question 11", "REMARKS"], live::REQUIRED).is_empty());
        assert_eq!(missing_columns([], live::REQUIRED).len(), 3);
    }
}
