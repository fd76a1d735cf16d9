use super::ledger::ResultLedger;

/// Read-only dependency check against the ledger of the current run.
pub struct DependencyGate<'a> {
    ledger: &'a ResultLedger,
}

impl<'a> DependencyGate<'a> {
    pub fn new(ledger: &'a ResultLedger) -> Self {
        Self { ledger }
    }

    /// First dependency without a successful entry, scanning in declared order.
    pub fn first_unsatisfied<'d>(&self, dependencies: &'d [String]) -> Option<&'d str> {
        dependencies
            .iter()
            .find(|dep| !self.ledger.succeeded(dep))
            .map(String::as_str)
    }

    pub fn is_open(&self, dependencies: &[String]) -> bool {
        self.first_unsatisfied(dependencies).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskFailure;
    use crate::executor::types::ResultEntry;
    use serde_json::json;

    fn deps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_no_dependencies_is_open() {
        let ledger = ResultLedger::new();
        assert!(DependencyGate::new(&ledger).is_open(&[]));
    }

    #[test]
    fn test_absent_or_failed_dependency_closes_gate() {
        let mut ledger = ResultLedger::new();
        ledger.record("ok", ResultEntry::succeeded(json!({}), 0));
        ledger.record("bad", ResultEntry::failed(&TaskFailure::Fault("x".into()), 0));
        let gate = DependencyGate::new(&ledger);

        assert!(gate.is_open(&deps(&["ok"])));
        assert_eq!(gate.first_unsatisfied(&deps(&["ok", "bad"])), Some("bad"));
        assert_eq!(
            gate.first_unsatisfied(&deps(&["missing", "bad"])),
            Some("missing")
        );
    }
}
