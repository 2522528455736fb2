use chrono::NaiveDate;

use super::codes;
use crate::core::{DocumentValidator, EfattureError, ValidationReport, XmlDocument};

/// Rejects invoice dates after the day of receipt.
///
/// `today` is injected so the check is reproducible; the SdI reasons in
/// Europe/Rome local time, so callers should compute it there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateSanityValidator {
    today: NaiveDate,
}

impl DateSanityValidator {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }
}

impl DocumentValidator for DateSanityValidator {
    fn name(&self) -> &'static str {
        "dates"
    }

    fn errors(&self, document: &XmlDocument) -> Result<ValidationReport, EfattureError> {
        let mut report = ValidationReport::new();
        let bodies = document.count("FatturaElettronicaBody")?;
        for i in 1..=bodies {
            let path = format!("FatturaElettronicaBody[{i}]/DatiGenerali/DatiGeneraliDocumento/Data");
            let Some(raw) = document.get(&path)? else {
                continue;
            };
            // Malformed dates are the schema's business.
            let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") else {
                continue;
            };
            if date > self.today {
                report.insert(
                    codes::DATE_IN_FUTURE,
                    format!(
                        "2.1.1.3 <Data> successiva alla data di ricezione ({raw} > {})",
                        self.today.format("%Y-%m-%d")
                    ),
                );
            }
        }
        Ok(report)
    }
}
