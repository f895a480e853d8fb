use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DecodeError, QueryError};

// ------------- BookField -------------
/// The fixed schema of a book record. This is also the complete
/// vocabulary of field names accepted by a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookField {
    Name,
    Author,
    Language,
    Genre,
    Publisher,
    ReleaseDate,
    MediaType,
    Pages,
    Isbn,
}

impl BookField {
    pub const ALL: [BookField; 9] = [
        BookField::Name,
        BookField::Author,
        BookField::Language,
        BookField::Genre,
        BookField::Publisher,
        BookField::ReleaseDate,
        BookField::MediaType,
        BookField::Pages,
        BookField::Isbn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookField::Name => "name",
            BookField::Author => "author",
            BookField::Language => "language",
            BookField::Genre => "genre",
            BookField::Publisher => "publisher",
            BookField::ReleaseDate => "release_date",
            BookField::MediaType => "media_type",
            BookField::Pages => "pages",
            BookField::Isbn => "isbn",
        }
    }
}

impl FromStr for BookField {
    type Err = QueryError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BookField::ALL
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| QueryError::InvalidField(s.to_owned()))
    }
}

impl fmt::Display for BookField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ------------- BookRecord -------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub name: String,
    pub author: String,
    pub language: String,
    pub genre: String,
    pub publisher: String,
    pub release_date: String,
    pub media_type: String,
    pub pages: String,
    pub isbn: String,
}

impl BookRecord {
    pub fn get(&self, field: BookField) -> &str {
        match field {
            BookField::Name => &self.name,
            BookField::Author => &self.author,
            BookField::Language => &self.language,
            BookField::Genre => &self.genre,
            BookField::Publisher => &self.publisher,
            BookField::ReleaseDate => &self.release_date,
            BookField::MediaType => &self.media_type,
            BookField::Pages => &self.pages,
            BookField::Isbn => &self.isbn,
        }
    }

    /// Projects a source mapping onto the fixed schema. Keys outside the
    /// schema are dropped and missing keys become empty strings.
    pub fn project(data: &Map<String, Value>) -> Self {
        let text = |field: BookField| data.get(field.as_str()).map(normalize).unwrap_or_default();
        Self {
            name: text(BookField::Name),
            author: text(BookField::Author),
            language: text(BookField::Language),
            genre: text(BookField::Genre),
            publisher: text(BookField::Publisher),
            release_date: text(BookField::ReleaseDate),
            media_type: text(BookField::MediaType),
            pages: text(BookField::Pages),
            isbn: text(BookField::Isbn),
        }
    }
}

fn normalize(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        // numbers, booleans, arrays and objects keep their compact JSON text
        other => other.to_string(),
    }
}

/// Decodes one line of the form `[identifier, {field: value, ...}]`.
/// Elements after the second are ignored.
pub fn decode_line(line: &str) -> Result<BookRecord, DecodeError> {
    let value: Value = serde_json::from_str(line)?;
    let elements = value
        .as_array()
        .ok_or(DecodeError::Shape("line is not an array"))?;
    if elements.len() < 2 {
        return Err(DecodeError::Shape("array has fewer than two elements"));
    }
    let data = elements[1]
        .as_object()
        .ok_or(DecodeError::Shape("second element is not an object"))?;
    Ok(BookRecord::project(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_fields_and_drops_the_rest() {
        let line = r#"["Q42", {"name": "Dune", "author": "Frank Herbert", "pages": 412, "wikidata": "x", "isbn": null}]"#;
        let record = decode_line(line).unwrap();
        assert_eq!(record.name, "Dune");
        assert_eq!(record.author, "Frank Herbert");
        assert_eq!(record.pages, "412");
        assert_eq!(record.isbn, "");
        assert_eq!(record.genre, "");
    }

    #[test]
    fn rejects_malformed_and_misshapen_lines() {
        assert!(matches!(decode_line("not json"), Err(DecodeError::Syntax(_))));
        assert!(matches!(decode_line(r#"{"name": "x"}"#), Err(DecodeError::Shape(_))));
        assert!(matches!(decode_line(r#"["only-one"]"#), Err(DecodeError::Shape(_))));
        assert!(matches!(decode_line(r#"["id", "not an object"]"#), Err(DecodeError::Shape(_))));
    }

    #[test]
    fn field_names_round_trip() {
        for field in BookField::ALL {
            assert_eq!(field.as_str().parse::<BookField>(), Ok(field));
        }
        assert_eq!(
            "title".parse::<BookField>(),
            Err(QueryError::InvalidField("title".into()))
        );
    }
}
