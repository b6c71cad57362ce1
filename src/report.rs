// Per-account results and the run-wide error report.

use crate::ui;
use serde_json::Value;

/// What went wrong under one label: a message of ours, or the API's own
/// response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetail {
    Message(String),
    Response(Value),
}

impl ErrorDetail {
    pub fn message(msg: impl Into<String>) -> Self {
        ErrorDetail::Message(msg.into())
    }

    pub fn to_json(&self) -> Value {
        match self {
            ErrorDetail::Message(msg) => serde_json::json!({ "msg": msg }),
            ErrorDetail::Response(v) => v.clone(),
        }
    }
}

/// Ordered label -> detail records. Re-inserting a label overwrites it in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorRecords {
    entries: Vec<(String, ErrorDetail)>,
}

impl ErrorRecords {
    pub fn insert(&mut self, label: impl Into<String>, detail: ErrorDetail) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some((_, existing)) => *existing = detail,
            None => self.entries.push((label, detail)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&ErrorDetail> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, d)| d)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ErrorDetail)> {
        self.entries.iter().map(|(l, d)| (l.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of processing one account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountResult {
    /// Resolved nickname, or `userid_<id>` when identity never resolved.
    pub nickname: String,
    pub errors: ErrorRecords,
}

impl AccountResult {
    pub fn new(nickname: impl Into<String>) -> Self {
        AccountResult {
            nickname: nickname.into(),
            errors: ErrorRecords::default(),
        }
    }

    pub fn record(&mut self, label: impl Into<String>, detail: ErrorDetail) {
        self.errors.insert(label, detail);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Everything the run collected, merged account by account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub accounts: usize,
    pub errors: ErrorRecords,
}

impl RunReport {
    pub fn merge(&mut self, result: AccountResult) {
        self.accounts += 1;
        for (label, detail) in result.errors.entries {
            self.errors.insert(label, detail);
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Print the final verdict. Never fails.
    pub fn summarize(&self) {
        if self.errors.is_empty() {
            ui::success(&format!(
                "\nAll {} account(s) processed, no errors!",
                self.accounts
            ));
            return;
        }

        ui::error("\nThis run had errors:");
        for (label, detail) in self.errors.iter() {
            let rendered = serde_json::to_string_pretty(&detail.to_json())
                .unwrap_or_else(|_| format!("{detail:?}"));
            println!("{label}: {rendered}");
        }
        ui::warn(&format!(
            "Finished all {} account(s), {} error record(s)",
            self.accounts,
            self.errors.len()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut records = ErrorRecords::default();
        records.insert("a", ErrorDetail::message("first"));
        records.insert("b", ErrorDetail::message("second"));
        records.insert("a", ErrorDetail::message("third"));
        assert_eq!(records.labels().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(records.get("a"), Some(&ErrorDetail::message("third")));
    }

    #[test]
    fn test_merge_keeps_account_order() {
        let mut report = RunReport::default();
        let mut first = AccountResult::new("mia");
        first.record("mia_listen", ErrorDetail::Response(json!({"status": 0})));
        report.merge(first);
        report.merge(AccountResult::new("leo"));
        let mut third = AccountResult::new("kai");
        third.record("kai", ErrorDetail::message("boom"));
        report.merge(third);

        assert_eq!(report.accounts, 3);
        assert!(report.has_errors());
        assert_eq!(report.errors.labels().collect::<Vec<_>>(), vec!["mia_listen", "kai"]);
    }

    #[test]
    fn test_detail_json() {
        assert_eq!(ErrorDetail::message("x").to_json(), json!({"msg": "x"}));
        let raw = json!({"status": 0, "error_code": 1});
        assert_eq!(ErrorDetail::Response(raw.clone()).to_json(), raw);
    }
}
