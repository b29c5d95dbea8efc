//! Document information dictionary.

/// Keys of the PDF `/Info` dictionary that are captured.
pub const INFO_KEYS: [&str; 8] = [
    "Title",
    "Author",
    "Subject",
    "Keywords",
    "Creator",
    "Producer",
    "CreationDate",
    "ModDate",
];

/// Document metadata from the `/Info` dictionary.
///
/// All fields are optional since PDFs may omit the dictionary entirely.
/// Dates are kept as raw PDF date strings (`D:YYYYMMDDHHmmSSOHH'mm'`).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
}

impl DocumentMetadata {
    /// Returns `true` if all metadata fields are `None`.
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<String>> {
        match key {
            "Title" => Some(&mut self.title),
            "Author" => Some(&mut self.author),
            "Subject" => Some(&mut self.subject),
            "Keywords" => Some(&mut self.keywords),
            "Creator" => Some(&mut self.creator),
            "Producer" => Some(&mut self.producer),
            "CreationDate" => Some(&mut self.creation_date),
            "ModDate" => Some(&mut self.mod_date),
            _ => None,
        }
    }

    /// Store an `/Info` entry by its PDF key. Returns `false` for keys
    /// that are not captured. Empty values are ignored.
    pub fn set_entry(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        match self.slot(key) {
            Some(slot) => {
                if !value.is_empty() {
                    *slot = Some(value);
                }
                true
            }
            None => false,
        }
    }

    /// Present entries as `(PDF key, value)` pairs in [`INFO_KEYS`] order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        let values = [
            &self.title,
            &self.author,
            &self.subject,
            &self.keywords,
            &self.creator,
            &self.producer,
            &self.creation_date,
            &self.mod_date,
        ];
        INFO_KEYS
            .into_iter()
            .zip(values)
            .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metadata_is_empty() {
        let meta = DocumentMetadata::default();
        assert!(meta.is_empty());
        assert_eq!(meta.entries().count(), 0);
    }

    #[test]
    fn set_entry_maps_info_keys() {
        let mut meta = DocumentMetadata::default();
        assert!(meta.set_entry("Title", "Voter Registration"));
        assert!(meta.set_entry("ModDate", "D:20240115000000Z"));
        assert!(!meta.set_entry("Trapped", "False"));
        assert!(meta.set_entry("Author", ""));
        assert_eq!(meta.title.as_deref(), Some("Voter Registration"));
        assert_eq!(meta.author, None);
        assert!(!meta.is_empty());
        let entries: Vec<_> = meta.entries().collect();
        assert_eq!(
            entries,
            vec![("Title", "Voter Registration"), ("ModDate", "D:20240115000000Z")]
        );
    }
}
