//! Minimal vCard 3.0 payloads for `text/vcard` records

/// MIME type used for contact records
pub const VCARD_MIME: &str = "text/vcard";

/// Contact details carried by a vCard record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCard {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl VCard {
    /// Build a card, treating blank strings as absent
    pub fn new(name: &str, phone: &str, email: &str) -> Self {
        fn field(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }
        Self {
            name: field(name),
            phone: field(phone),
            email: field(email),
        }
    }

    /// Render the card; absent fields produce no line
    pub fn render(&self) -> String {
        let mut out = String::from("BEGIN:VCARD\nVERSION:3.0\n");
        for (key, value) in [("FN", &self.name), ("TEL", &self.phone), ("EMAIL", &self.email)] {
            if let Some(value) = value {
                out.push_str(key);
                out.push(':');
                out.push_str(value);
                out.push('\n');
            }
        }
        out.push_str("END:VCARD");
        out
    }

    /// Read FN, TEL and EMAIL back out of a vCard document
    ///
    /// Both `\n` and `\r\n` line endings are accepted; type parameters such
    /// as `TEL;TYPE=cell:` are skipped over.
    pub fn parse(content: &str) -> Self {
        let mut card = VCard::default();
        for line in content.lines() {
            let line = line.trim_end_matches('\r');
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.split(';').next().unwrap_or(key).to_ascii_uppercase();
            let value = Some(value.to_string()).filter(|v| !v.is_empty());
            match key.as_str() {
                "FN" => card.name = value,
                "TEL" => card.phone = value,
                "EMAIL" => card.email = value,
                _ => {}
            }
        }
        card
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_full() {
        let card = VCard::new("Ada Lovelace", "+441234", "ada@example.com");
        assert_eq!(
            card.render(),
            "BEGIN:VCARD\nVERSION:3.0\nFN:Ada Lovelace\nTEL:+441234\nEMAIL:ada@example.com\nEND:VCARD"
        );
    }

    #[test]
    fn test_render_omits_blank_fields() {
        let card = VCard::new("Ada", "  ", "");
        assert_eq!(card.render(), "BEGIN:VCARD\nVERSION:3.0\nFN:Ada\nEND:VCARD");
        assert!(VCard::new("", "", "").is_empty());
    }

    #[test]
    fn test_parse() {
        let card = VCard::new("Ada", "+44", "ada@example.com");
        assert_eq!(VCard::parse(&card.render()), card);

        let crlf = "BEGIN:VCARD\r\nVERSION:3.0\r\nTEL;TYPE=cell:555\r\nEND:VCARD\r\n";
        let parsed = VCard::parse(crlf);
        assert_eq!(parsed.phone.as_deref(), Some("555"));
        assert!(parsed.name.is_none());
    }
}
