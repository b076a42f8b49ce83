//! Dublin Core projection of records

use oaipmh_db::Record;
use std::collections::BTreeMap;

/// The fifteen elements of unqualified Dublin Core, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DcElement {
    Title,
    Creator,
    Subject,
    Description,
    Publisher,
    Contributor,
    Date,
    Type,
    Format,
    Identifier,
    Source,
    Language,
    Relation,
    Coverage,
    Rights,
}

impl DcElement {
    pub fn as_str(&self) -> &'static str {
        match self {
            DcElement::Title => "title",
            DcElement::Creator => "creator",
            DcElement::Subject => "subject",
            DcElement::Description => "description",
            DcElement::Publisher => "publisher",
            DcElement::Contributor => "contributor",
            DcElement::Date => "date",
            DcElement::Type => "type",
            DcElement::Format => "format",
            DcElement::Identifier => "identifier",
            DcElement::Source => "source",
            DcElement::Language => "language",
            DcElement::Relation => "relation",
            DcElement::Coverage => "coverage",
            DcElement::Rights => "rights",
        }
    }

    /// Element name with the `dc:` prefix
    pub fn qualified_name(&self) -> String {
        format!("dc:{}", self.as_str())
    }
}

/// Dublin Core values of one record, grouped by element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DublinCore {
    fields: BTreeMap<DcElement, Vec<String>>,
}

impl DublinCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value; blank values are skipped
    pub fn push(&mut self, element: DcElement, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            return;
        }
        self.fields.entry(element).or_default().push(value);
    }

    /// Builder-style `push`
    pub fn with(mut self, element: DcElement, value: impl Into<String>) -> Self {
        self.push(element, value);
        self
    }

    pub fn values(&self, element: DcElement) -> &[String] {
        self.fields.get(&element).map(Vec::as_slice).unwrap_or_default()
    }

    /// Iterate over all values in schema element order
    pub fn iter(&self) -> impl Iterator<Item = (DcElement, &str)> {
        self.fields
            .iter()
            .flat_map(|(element, values)| values.iter().map(move |v| (*element, v.as_str())))
    }

    /// Default projection of a catalog record
    pub fn from_record(record: &Record) -> Self {
        let mut dc = DublinCore::new()
            .with(DcElement::Title, record.title.as_str())
            .with(DcElement::Description, record.description.as_str())
            .with(DcElement::Date, record.last_change.format("%Y-%m-%d").to_string())
            .with(DcElement::Identifier, record.identifier.as_str());

        for (element, value) in [
            (DcElement::Creator, &record.creator),
            (DcElement::Publisher, &record.publisher),
            (DcElement::Language, &record.language),
            (DcElement::Rights, &record.rights),
        ] {
            if let Some(value) = value {
                dc.push(element, value.as_str());
            }
        }
        for subject in &record.subjects {
            dc.push(DcElement::Subject, subject.as_str());
        }
        dc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_from_record() {
        let record = Record {
            identifier: "42".to_string(),
            title: "Answer".to_string(),
            description: "  ".to_string(),
            creator: Some("Deep Thought".to_string()),
            publisher: None,
            language: Some("en".to_string()),
            rights: None,
            subjects: vec!["philosophy".to_string(), "computing".to_string()],
            last_change: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
            set_specs: vec![],
        };

        let dc = DublinCore::from_record(&record);
        assert_eq!(dc.values(DcElement::Title), &["Answer"]);
        assert!(dc.values(DcElement::Description).is_empty());
        assert!(dc.values(DcElement::Publisher).is_empty());
        assert_eq!(dc.values(DcElement::Date), &["2024-03-01"]);
        assert_eq!(dc.values(DcElement::Subject), &["philosophy", "computing"]);

        let order: Vec<_> = dc.iter().map(|(element, _)| element.as_str()).collect();
        assert_eq!(
            order,
            vec!["title", "creator", "subject", "subject", "date", "identifier", "language"]
        );
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(DcElement::Rights.qualified_name(), "dc:rights");
    }
}
