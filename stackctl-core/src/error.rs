//! Operational routing policy for classified failures.
//!
//! Each classified error carries four independent booleans that downstream
//! consumers use to decide what happens next: retry the whole operation,
//! page an operator, park the failed unit of work on the dead-letter queue,
//! and record the failure in the durable error history. The flags are plain
//! data - named constants fix the combinations instead of a subclass
//! hierarchy.

/// Routing flags attached to a classified failure.
///
/// `retry` means "should the *caller* retry the whole operation" - distinct
/// from the executor's internal retry-on-transient-error loop, which has
/// already run by the time a caller sees one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    /// Caller should retry the whole operation.
    pub retry: bool,
    /// An operator alert should go out.
    pub send_alert: bool,
    /// The failed unit of work belongs on the dead-letter queue.
    pub dead_letter: bool,
    /// The failure should be recorded in the error history.
    pub audit: bool,
}

impl ErrorPolicy {
    /// General database failure: worth retrying from the top, and worth
    /// alerting, dead-lettering, and auditing.
    pub const DATABASE: Self = Self {
        retry: true,
        send_alert: true,
        dead_letter: true,
        audit: true,
    };

    /// Lock wait timeout / deadlock after internal retries were exhausted.
    /// Callers must not retry again - the executor already did.
    pub const LOCK: Self = Self {
        retry: false,
        send_alert: true,
        dead_letter: true,
        audit: true,
    };

    /// Build a policy with explicit flags.
    pub const fn new(retry: bool, send_alert: bool, dead_letter: bool, audit: bool) -> Self {
        Self {
            retry,
            send_alert,
            dead_letter,
            audit,
        }
    }
}

impl Default for ErrorPolicy {
    /// Everything routes (alert, dead-letter, audit) but nothing implies a
    /// caller-level retry unless explicitly opted in.
    fn default() -> Self {
        Self {
            retry: false,
            send_alert: true,
            dead_letter: true,
            audit: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_routes_everything_but_never_retries() {
        let policy = ErrorPolicy::default();
        assert!(!policy.retry);
        assert!(policy.send_alert);
        assert!(policy.dead_letter);
        assert!(policy.audit);
    }

    #[test]
    fn database_policy_is_caller_retryable() {
        let policy = ErrorPolicy::DATABASE;
        assert!(policy.retry);
        assert!(policy.send_alert);
        assert!(policy.dead_letter);
        assert!(policy.audit);
    }

    #[test]
    fn lock_policy_is_not_caller_retryable() {
        let policy = ErrorPolicy::LOCK;
        assert!(!policy.retry);
        assert!(policy.send_alert);
        assert!(policy.dead_letter);
        assert!(policy.audit);
    }

    #[test]
    fn new_sets_all_flags() {
        let policy = ErrorPolicy::new(true, false, true, false);
        assert!(policy.retry);
        assert!(!policy.send_alert);
        assert!(policy.dead_letter);
        assert!(!policy.audit);
    }
}
