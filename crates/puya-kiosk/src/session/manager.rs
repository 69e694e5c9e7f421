//! Per-kiosk session: duplicate-scan suppression and the last product shown.

use chrono::{DateTime, Utc};

use puya_lookup::{LookupOutcome, ProductRecord};

/// Counters shown by `/status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub lookups: u32,
    pub found: u32,
    pub not_found: u32,
    pub failed: u32,
    pub duplicates_skipped: u32,
}

/// Session state owned by the kiosk loop and passed in explicitly.
///
/// The last-identifier slot is read before it is written: a capture equal to
/// the slot's value is a repeat of the same scan and does not trigger a lookup.
/// The last attempted code survives failures so `/again` can retry it.
#[derive(Debug, Default)]
pub struct KioskSession {
    last_identifier: Option<String>,
    last_attempted: Option<String>,
    last_product: Option<(ProductRecord, DateTime<Utc>)>,
    stats: SessionStats,
}

impl KioskSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether `identifier` needs a lookup, claiming the slot if so.
    pub fn observe(&mut self, identifier: &str) -> bool {
        if self.last_identifier.as_deref() == Some(identifier) {
            self.stats.duplicates_skipped += 1;
            tracing::debug!("Skipping repeat scan of {identifier}");
            return false;
        }
        self.last_identifier = Some(identifier.to_string());
        self.last_attempted = Some(identifier.to_string());
        true
    }

    /// Forget the last identifier so the next capture is looked up again.
    pub fn reset(&mut self) {
        self.last_identifier = None;
    }

    /// Record the outcome of a lookup that [`observe`](Self::observe) allowed.
    pub fn record(&mut self, outcome: &LookupOutcome) {
        self.stats.lookups += 1;
        match outcome {
            LookupOutcome::Found { product } => {
                self.stats.found += 1;
                self.last_product = Some((product.clone(), Utc::now()));
            }
            LookupOutcome::NotFound => self.stats.not_found += 1,
            LookupOutcome::AuthenticationFailed { .. } | LookupOutcome::TransportError { .. } => {
                self.stats.failed += 1;
                // Failures release the slot so the same code can be retried.
                self.reset();
            }
        }
    }

    pub fn last_identifier(&self) -> Option<&str> {
        self.last_identifier.as_deref()
    }

    /// The last code sent to the ERP, whatever the outcome.
    pub fn last_attempted(&self) -> Option<&str> {
        self.last_attempted.as_deref()
    }

    /// The last product found and when it was looked up.
    pub fn last_product(&self) -> Option<(&ProductRecord, DateTime<Utc>)> {
        self.last_product.as_ref().map(|(p, at)| (p, *at))
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(qty: f64) -> ProductRecord {
        ProductRecord {
            name: "Arroz 1kg".to_string(),
            list_price: 2.5,
            barcode: "7501234567890".to_string(),
            internal_code: "AR-001".to_string(),
            available_quantity: qty,
        }
    }

    #[test]
    fn test_repeat_scan_is_suppressed() {
        let mut session = KioskSession::new();
        assert!(session.observe("7501234567890"));
        assert!(!session.observe("7501234567890"));
        assert!(session.observe("000"));
        assert!(session.observe("7501234567890"));
        assert_eq!(session.stats().duplicates_skipped, 1);
    }

    #[test]
    fn test_reset_allows_same_code_again() {
        let mut session = KioskSession::new();
        assert!(session.observe("7501234567890"));
        session.reset();
        assert_eq!(session.last_identifier(), None);
        assert!(session.observe("7501234567890"));
    }

    #[test]
    fn test_record_keeps_last_found_product() {
        let mut session = KioskSession::new();
        session.observe("7501234567890");
        session.record(&LookupOutcome::Found {
            product: product(42.0),
        });
        session.observe("000");
        session.record(&LookupOutcome::NotFound);

        let (last, _) = session.last_product().unwrap();
        assert_eq!(last.available_quantity, 42.0);
        assert_eq!(
            session.stats(),
            SessionStats {
                lookups: 2,
                found: 1,
                not_found: 1,
                failed: 0,
                duplicates_skipped: 0,
            }
        );
    }

    #[test]
    fn test_failed_lookup_releases_slot() {
        let mut session = KioskSession::new();
        assert!(session.observe("7501234567890"));
        session.record(&LookupOutcome::TransportError {
            message: "connection reset".to_string(),
        });
        assert!(session.observe("7501234567890"));
        assert_eq!(session.stats().failed, 1);
    }

    #[test]
    fn test_failure_keeps_last_attempted_code() {
        let mut session = KioskSession::new();
        session.observe("7501234567890");
        session.record(&LookupOutcome::TransportError {
            message: "connection reset".to_string(),
        });
        assert_eq!(session.last_identifier(), None);
        assert_eq!(session.last_attempted(), Some("7501234567890"));

        session.reset();
        assert_eq!(session.last_attempted(), Some("7501234567890"));
    }
}
