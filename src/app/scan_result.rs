// SPDX-License-Identifier: MPL-2.0

//! Scan result dialog state

use crate::backends::decoder::Barcode;
use crate::backends::launcher::UrlLauncher;
use crate::errors::ScanError;
use tracing::{debug, info};

/// What a scanned value looks like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Starts with a URI scheme the launcher can open
    Link,
    PlainData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub text: String,
    pub kind: ScanKind,
}

impl ScanResult {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let kind = classify(&text);
        Self { text, kind }
    }

    pub fn is_link(&self) -> bool {
        self.kind == ScanKind::Link
    }
}

/// Schemes without an authority (`scheme:rest`) that are opened as links
const OPAQUE_LINK_SCHEMES: &[&str] = &["mailto", "tel", "sms", "smsto", "geo", "sip", "sips"];

/// Link iff the text starts with a URI scheme.
///
/// A scheme is an ASCII letter followed by letters, digits, `+`, `-` or `.`.
/// Any scheme followed by `://` is a link. A bare `scheme:` is only a link
/// for the schemes in [`OPAQUE_LINK_SCHEMES`]; payloads such as `WIFI:`,
/// `MECARD:` or `BEGIN:VCARD` stay plain data.
pub fn classify(text: &str) -> ScanKind {
    let Some((scheme, rest)) = text.trim_start().split_once(':') else {
        return ScanKind::PlainData;
    };

    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid {
        return ScanKind::PlainData;
    }

    let hierarchical = rest.starts_with("//");
    let opaque = !rest.trim().is_empty()
        && OPAQUE_LINK_SCHEMES
            .iter()
            .any(|known| scheme.eq_ignore_ascii_case(known));

    if hierarchical || opaque {
        ScanKind::Link
    } else {
        ScanKind::PlainData
    }
}

/// Holds the result shown in the scan dialog
#[derive(Debug, Clone, Default)]
pub struct ScanResultPresenter {
    current: Option<ScanResult>,
}

impl ScanResultPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ScanResult> {
        self.current.as_ref()
    }

    /// Show the first non-empty value; the rest are discarded.
    ///
    /// With nothing usable the dialog keeps whatever it showed before.
    pub fn on_decoded(&mut self, barcodes: Vec<Barcode>) -> Option<&ScanResult> {
        let total = barcodes.len();
        let Some(first) = barcodes
            .into_iter()
            .find(|barcode| !barcode.text.trim().is_empty())
        else {
            debug!(total, "No usable barcode in scan");
            return None;
        };

        let result = ScanResult::new(first.text);
        info!(kind = ?result.kind, discarded = total.saturating_sub(1), "Scan result ready");
        Some(self.current.insert(result))
    }

    pub fn dismiss(&mut self) {
        if self.current.take().is_some() {
            debug!("Scan result dismissed");
        }
    }

    /// Open the current link and close the dialog.
    ///
    /// The dialog is closed even if the launcher fails. Plain data is left
    /// on screen and refused with [`ScanError::NotALink`].
    pub fn open_link(&mut self, launcher: &dyn UrlLauncher) -> Result<String, ScanError> {
        match &self.current {
            None => Err(ScanError::NoResult),
            Some(result) if !result.is_link() => Err(ScanError::NotALink),
            Some(_) => {
                let Some(result) = self.current.take() else {
                    return Err(ScanError::NoResult);
                };
                launcher.open(&result.text)?;
                Ok(result.text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::decoder::Symbology;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeLauncher {
        opened: Mutex<Vec<String>>,
        fail: bool,
    }

    impl UrlLauncher for FakeLauncher {
        fn open(&self, url: &str) -> Result<(), ScanError> {
            if self.fail {
                return Err(ScanError::LaunchFailed("no browser".to_string()));
            }
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    fn qr(text: &str) -> Barcode {
        Barcode {
            text: text.to_string(),
            symbology: Symbology::Qr,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("https://example.com"), ScanKind::Link);
        assert_eq!(classify("12345678"), ScanKind::PlainData);
        assert_eq!(classify("git+ssh://host/repo"), ScanKind::Link);
        assert_eq!(classify("WIFI:S:home;T:WPA;P:secret;;"), ScanKind::PlainData);
        assert_eq!(classify("://missing-scheme"), ScanKind::PlainData);
        assert_eq!(classify("1http://digit-first"), ScanKind::PlainData);
        assert_eq!(classify("see https://example.com"), ScanKind::PlainData);
    }

    #[test]
    fn test_classify_opaque_schemes() {
        assert_eq!(classify("mailto:someone@example.com"), ScanKind::Link);
        assert_eq!(classify("tel:+15551234"), ScanKind::Link);
        assert_eq!(classify("geo:37.78,-122.4"), ScanKind::Link);
        assert_eq!(classify("SMSTO:+15551234:hello"), ScanKind::Link);
        assert_eq!(classify("tel:"), ScanKind::PlainData);

        // Structured payloads look like schemes but are not openable
        assert_eq!(classify("MECARD:N:Doe,John;;"), ScanKind::PlainData);
        assert_eq!(classify("BEGIN:VCARD"), ScanKind::PlainData);
        assert_eq!(classify("Note: call back"), ScanKind::PlainData);
        assert_eq!(classify("12:30"), ScanKind::PlainData);
    }

    #[test]
    fn test_open_mailto_link() {
        let launcher = FakeLauncher::default();
        let mut presenter = ScanResultPresenter::new();
        presenter.on_decoded(vec![qr("mailto:someone@example.com")]);

        assert_eq!(
            presenter.open_link(&launcher),
            Ok("mailto:someone@example.com".to_string())
        );
        assert_eq!(*launcher.opened.lock().unwrap(), vec!["mailto:someone@example.com"]);
    }

    #[test]
    fn test_first_non_empty_wins() {
        let mut presenter = ScanResultPresenter::new();
        let result = presenter
            .on_decoded(vec![qr("  "), qr("12345678"), qr("https://example.com")])
            .cloned();
        assert_eq!(result, Some(ScanResult::new("12345678")));
        assert_eq!(presenter.current().map(|r| r.kind), Some(ScanKind::PlainData));
    }

    #[test]
    fn test_empty_scan_keeps_previous() {
        let mut presenter = ScanResultPresenter::new();
        presenter.on_decoded(vec![qr("abc")]);
        assert!(presenter.on_decoded(Vec::new()).is_none());
        assert_eq!(presenter.current().map(|r| r.text.as_str()), Some("abc"));
    }

    #[test]
    fn test_open_link_clears() {
        let launcher = FakeLauncher::default();
        let mut presenter = ScanResultPresenter::new();
        presenter.on_decoded(vec![qr("https://example.com")]);

        assert_eq!(
            presenter.open_link(&launcher),
            Ok("https://example.com".to_string())
        );
        assert!(presenter.current().is_none());
        assert_eq!(*launcher.opened.lock().unwrap(), vec!["https://example.com"]);
    }

    #[test]
    fn test_open_plain_data_refused() {
        let launcher = FakeLauncher::default();
        let mut presenter = ScanResultPresenter::new();
        assert_eq!(presenter.open_link(&launcher), Err(ScanError::NoResult));

        presenter.on_decoded(vec![qr("12345678")]);
        assert_eq!(presenter.open_link(&launcher), Err(ScanError::NotALink));
        assert!(presenter.current().is_some());
        assert!(launcher.opened.lock().unwrap().is_empty());
    }

    #[test]
    fn test_launch_failure_still_clears() {
        let launcher = FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        };
        let mut presenter = ScanResultPresenter::new();
        presenter.on_decoded(vec![qr("https://example.com")]);

        assert!(matches!(
            presenter.open_link(&launcher),
            Err(ScanError::LaunchFailed(_))
        ));
        assert!(presenter.current().is_none());
    }
}
