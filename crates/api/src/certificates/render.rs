//! Certificate renderers.
//!
//! [`BuiltinRenderer`] writes a single-page PDF using the standard Helvetica
//! font, or plain text. Both show the same lines, built by
//! [`document_lines`]. Characters outside Latin-1 are printed as `?` in the
//! PDF because the built-in font cannot show them; the text format keeps
//! them.

use std::fmt::Write as _;

use tiketon_core::accrual::format_hours_minutes;
use tiketon_core::certificate::{format_date, ArtifactFormat, CertificateDocument, CertificateScope};
use tiketon_core::error::CoreError;

/// Turns a certificate document into an artifact.
///
/// Implementations must be pure: issuance calls `render` inside the
/// transaction that zeroes the ledger, and an error rolls that back.
pub trait CertificateRenderer: Send + Sync {
    fn render(&self, document: &CertificateDocument, format: ArtifactFormat) -> Result<Vec<u8>, CoreError>;
}

/// Renderer shipped with the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinRenderer;

impl CertificateRenderer for BuiltinRenderer {
    fn render(&self, document: &CertificateDocument, format: ArtifactFormat) -> Result<Vec<u8>, CoreError> {
        let lines = document_lines(document);
        Ok(match format {
            ArtifactFormat::Pdf => render_pdf(&lines),
            ArtifactFormat::Txt => render_text(&lines),
        })
    }
}

/// The printed lines of a certificate, title first.
pub fn document_lines(document: &CertificateDocument) -> Vec<String> {
    let unit = if document.hours == 1 { "hour" } else { "hours" };
    let mut lines = vec![
        "CERTIFICATE OF VOLUNTEER SERVICE".to_string(),
        String::new(),
        "This certifies that".to_string(),
        document.full_name.clone(),
        format!("contributed {} {unit} of volunteer work", document.hours),
    ];

    match &document.scope {
        CertificateScope::Event {
            event_name,
            event_date,
            leader_name,
        } => {
            lines.push(format!("at \"{event_name}\" on {}", format_date(*event_date)));
            if let Some(leader) = leader_name {
                lines.push(format!("Team leader: {leader}"));
            }
        }
        CertificateScope::Period { items, .. } => {
            if let Some(period) = document.period_text() {
                lines.push(format!("during the period {period}"));
            }
            if !items.is_empty() {
                lines.push(String::new());
                for item in items {
                    lines.push(format!(
                        "- {} ({}): {}",
                        item.event_name,
                        format_date(item.event_date),
                        format_hours_minutes(item.hours)
                    ));
                }
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("Issued on {}", format_date(document.issued_on)));
    lines
}

fn render_text(lines: &[String]) -> Vec<u8> {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out.into_bytes()
}

// ---------------------------------------------------------------------------
// PDF
// ---------------------------------------------------------------------------

const TITLE_SIZE: u32 = 20;
const BODY_SIZE: u32 = 12;
const LEADING: u32 = 18;

fn render_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = format!("BT\n/F1 {TITLE_SIZE} Tf\n{LEADING} TL\n72 770 Td\n").into_bytes();
    for (i, line) in lines.iter().enumerate() {
        if i == 1 {
            content.extend(format!("/F1 {BODY_SIZE} Tf\n").into_bytes());
        }
        content.push(b'(');
        content.extend(escape_pdf_text(line));
        content.extend_from_slice(b") Tj\nT*\n");
    }
    content.extend_from_slice(b"ET\n");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 595 842] \
          /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];
    let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
    stream.extend(content);
    stream.extend_from_slice(b"endstream");
    objects.push(stream);

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend(format!("{} 0 obj\n", i + 1).into_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = writeln!(xref, "{offset:010} 00000 n ");
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    );
    pdf.extend(xref.into_bytes());
    pdf
}

/// Encode a line as the body of a PDF literal string.
fn escape_pdf_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev_upper = false;
    while let Some(c) = chars.next() {
        // Multi-letter spellings follow the word's case: "ЖАНАР" is "ZHANAR".
        let in_caps = c.is_uppercase() && (prev_upper || chars.peek().is_some_and(|n| n.is_uppercase()));
        prev_upper = c.is_uppercase();
        match c {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(c as u8);
            }
            c if (c as u32) < 0x20 => out.push(b' '),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            c => match transliterate(c) {
                Some(latin) if in_caps => out.extend(latin.bytes().map(|b| b.to_ascii_uppercase())),
                Some(latin) => out.extend_from_slice(latin.as_bytes()),
                None => out.push(b'?'),
            },
        }
    }
    out
}

/// Latin spelling of a Cyrillic letter (Russian and Kazakh alphabets).
///
/// The built-in PDF font is Latin-1 only, so names are printed transliterated
/// rather than as `?`. Capital letters map to a capitalised spelling.
#[rustfmt::skip]
fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'А' => "A", 'а' => "a", 'Б' => "B", 'б' => "b", 'В' => "V", 'в' => "v",
        'Г' => "G", 'г' => "g", 'Д' => "D", 'д' => "d", 'Е' => "E", 'е' => "e",
        'Ё' => "Yo", 'ё' => "yo", 'Ж' => "Zh", 'ж' => "zh", 'З' => "Z", 'з' => "z",
        'И' => "I", 'и' => "i", 'Й' => "Y", 'й' => "y", 'К' => "K", 'к' => "k",
        'Л' => "L", 'л' => "l", 'М' => "M", 'м' => "m", 'Н' => "N", 'н' => "n",
        'О' => "O", 'о' => "o", 'П' => "P", 'п' => "p", 'Р' => "R", 'р' => "r",
        'С' => "S", 'с' => "s", 'Т' => "T", 'т' => "t", 'У' => "U", 'у' => "u",
        'Ф' => "F", 'ф' => "f", 'Х' => "Kh", 'х' => "kh", 'Ц' => "Ts", 'ц' => "ts",
        'Ч' => "Ch", 'ч' => "ch", 'Ш' => "Sh", 'ш' => "sh", 'Щ' => "Shch", 'щ' => "shch",
        'Ъ' | 'ъ' | 'Ь' | 'ь' => "", 'Ы' => "Y", 'ы' => "y",
        'Э' => "E", 'э' => "e", 'Ю' => "Yu", 'ю' => "yu", 'Я' => "Ya", 'я' => "ya",
        'Ә' => "A", 'ә' => "a", 'Ғ' => "G", 'ғ' => "g", 'Қ' => "Q", 'қ' => "q",
        'Ң' => "N", 'ң' => "n", 'Ө' => "O", 'ө' => "o", 'Ұ' => "U", 'ұ' => "u",
        'Ү' => "U", 'ү' => "u", 'Һ' => "H", 'һ' => "h", 'І' => "I", 'і' => "i",
        _ => return None,
    };
    Some(latin)
}
