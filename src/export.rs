//! CSV export of the generated-email collection.
//!
//! One row per email with the fields a spreadsheet user wants to triage
//! outreach: date, company, contact, service, subject, body. The output is
//! prefixed with a UTF-8 byte-order marker so spreadsheet applications
//! detect the encoding, and the `csv` crate applies standard quoting.

use std::io::Write;

use crate::domain::{EmailContent, GeneratedEmail};

/// UTF-8 byte-order marker expected by spreadsheet applications.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors from writing the export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Output sink failure.
    #[error("export write failed: {0}")]
    Io(#[from] std::io::Error),
    /// CSV serialization failure.
    #[error("export encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `emails` as CSV to `out`, newest first as stored.
///
/// An email whose stored body no longer parses exports with empty subject
/// and body fields rather than failing the whole document.
///
/// # Errors
///
/// Returns [`ExportError`] only on sink or encoding failure.
pub fn write_emails_csv(emails: &[GeneratedEmail], out: &mut impl Write) -> Result<(), ExportError> {
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record([
        "date", "company", "contact", "email", "service", "subject", "body",
    ])?;

    for email in emails {
        let content = email.content().unwrap_or_else(|_| EmailContent::default());
        writer.write_record([
            email.created_at.to_rfc3339().as_str(),
            email.recipient.company_name.as_str(),
            email.recipient.contact.name.as_str(),
            email.recipient.contact.email.as_str(),
            email.service.name.as_str(),
            content.subject.as_str(),
            content.body.as_str(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
