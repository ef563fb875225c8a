//! Single-document output

use crate::RecordError;
use pdf_core::Finalize;
use std::path::Path;
use template::{AssetSet, CertificateRecord, Renderer, TemplateId};

/// Default file name for a recipient: `Certificate_<name>.pdf`
///
/// Spaces and path separators in the name become underscores, so the file
/// always lands directly in the output directory.
pub fn certificate_file_name(name: &str) -> String {
    let safe: String = name
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    format!("Certificate_{safe}.pdf")
}

/// Render one certificate with default options and write it to `path`
pub fn write_single(
    template: TemplateId,
    record: &CertificateRecord,
    assets: &AssetSet,
    path: &Path,
) -> Result<(), RecordError> {
    write_single_with(&Renderer::new(), template, record, assets, path)
}

/// Render one certificate with `renderer` and write it to `path`
pub fn write_single_with(
    renderer: &Renderer,
    template: TemplateId,
    record: &CertificateRecord,
    assets: &AssetSet,
    path: &Path,
) -> Result<(), RecordError> {
    let document = renderer.render(template, record, assets, Finalize::Final)?;
    std::fs::write(path, document.bytes())?;
    log::info!(
        "wrote {} ({} bytes, {})",
        path.display(),
        document.bytes().len(),
        template
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_file_name() {
        assert_eq!(certificate_file_name("Jane Smith"), "Certificate_Jane_Smith.pdf");
        assert_eq!(certificate_file_name("a/b\\c"), "Certificate_a_b_c.pdf");
        assert_eq!(certificate_file_name(" Bo "), "Certificate_Bo.pdf");
    }

    #[test]
    fn test_write_single() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let record = CertificateRecord::new("Jane", "Rust", "2024-03-15", None).unwrap();
        write_single(
            TemplateId::CorporateAchievement,
            &record,
            &AssetSet::default(),
            &path,
        )
        .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_missing_parent_is_io_error() {
        let record = CertificateRecord::new("Jane", "Rust", "2024-03-15", None).unwrap();
        let err = write_single(
            TemplateId::CorporateAchievement,
            &record,
            &AssetSet::default(),
            Path::new("/nonexistent/dir/out.pdf"),
        )
        .unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }
}
