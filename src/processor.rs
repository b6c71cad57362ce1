// Account processing.
//
// Accounts are handled one at a time, in input order, and every stage of
// an account runs in order: identity, listen claim, check-in loop, VIP
// status. Nothing that happens to one account stops the next one.

use crate::api::{Claim, RewardApi, ALREADY_CLAIMED, CHECKINS_EXHAUSTED};
use crate::config::{display_userid, ClaimSettings, Credential};
use crate::error::ApiError;
use crate::report::{AccountResult, ErrorDetail, RunReport};
use crate::ui::{self, Pause};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

/// How the check-in loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInEnd {
    /// Every allowed check-in succeeded.
    AllClaimed,
    /// The API reported no check-ins left after `claimed` successes.
    Exhausted { claimed: u32 },
    /// Check-in number `iteration` failed; the loop stopped there.
    Failed { iteration: u32 },
}

/// Date shown next to the VIP expiry: now, shifted to UTC+8.
pub fn display_date(now: DateTime<Utc>) -> String {
    (now + chrono::Duration::hours(8))
        .format("%Y-%m-%d")
        .to_string()
}

pub struct Processor<A, P> {
    api: A,
    pause: P,
    settings: ClaimSettings,
    date: String,
}

impl<A: RewardApi, P: Pause> Processor<A, P> {
    pub fn new(api: A, pause: P, settings: ClaimSettings, date: String) -> Self {
        Processor {
            api,
            pause,
            settings,
            date,
        }
    }

    #[cfg(test)]
    fn pause(&self) -> &P {
        &self.pause
    }

    /// Process every entry and merge the per-account results.
    pub fn run(&mut self, entries: &[Value]) -> RunReport {
        let mut report = RunReport::default();
        for (index, entry) in entries.iter().enumerate() {
            let result = self.process_account(index, entry);
            debug!(account = index + 1, errors = result.errors.len(), "account done");
            report.merge(result);
        }
        report
    }

    pub fn process_account(&mut self, index: usize, entry: &Value) -> AccountResult {
        let slot = index + 1;
        ui::heading(&format!(
            "\n===== Account {slot} (userid: {}) =====",
            display_userid(entry)
        ));

        let Some(cred) = Credential::from_value(entry) else {
            let msg = "Incomplete account: token or userid missing";
            ui::error(msg);
            let label = format!("account_{slot}");
            let mut result = AccountResult::new(label.clone());
            result.record(label, ErrorDetail::message(msg));
            return result;
        };

        let mut result = AccountResult::new(format!("userid_{}", cred.userid));
        if let Err(e) = self.claim_all(&cred, &mut result) {
            let msg = format!("Account {} failed: {e}", result.nickname);
            warn!(account = slot, error = %e, "account aborted");
            ui::error(&msg);
            let label = result.nickname.clone();
            result.record(label, ErrorDetail::message(msg));
        }
        result
    }

    fn claim_all(&mut self, cred: &Credential, result: &mut AccountResult) -> Result<(), ApiError> {
        let detail = self.api.user_detail(cred)?;
        let Some(nickname) = detail.nickname() else {
            let msg = "Token expired or account does not exist";
            ui::error(msg);
            let label = result.nickname.clone();
            result.record(label, ErrorDetail::message(msg));
            return Ok(());
        };
        result.nickname = nickname.to_string();
        ui::heading(&format!("Claiming VIP for {nickname}..."));

        self.claim_listen(cred, result)?;
        let end = self.claim_check_ins(cred, result);
        info!(nickname = %result.nickname, ?end, "check-ins finished");
        self.report_vip_status(cred, result)
    }

    fn claim_listen(&mut self, cred: &Credential, result: &mut AccountResult) -> Result<(), ApiError> {
        ui::step("Claiming VIP by listening...");
        let resp = self.api.listen_song(cred)?;
        match resp.classify(ALREADY_CLAIMED) {
            Claim::Success => ui::success("Listen reward claimed"),
            Claim::AlreadyDone => ui::success("Listen reward already claimed today"),
            Claim::Failed => {
                ui::error(&format!("Listen reward failed: {}", resp.describe()));
                result.record(
                    format!("{}_listen", result.nickname),
                    ErrorDetail::Response(resp.to_value()),
                );
            }
        }
        Ok(())
    }

    /// Check in up to `max_checkins` times. Any failure, including a
    /// request error, is recorded against its iteration and ends the loop.
    pub fn claim_check_ins(&mut self, cred: &Credential, result: &mut AccountResult) -> CheckInEnd {
        ui::step("Claiming VIP by check-in...");
        let max = self.settings.max_checkins;
        for i in 1..=max {
            let resp = match self.api.check_in(cred) {
                Ok(resp) => resp,
                Err(e) => {
                    ui::error(&format!("Check-in {i} raised an error: {e}"));
                    result.record(
                        format!("{}_checkin_{i}_exception", result.nickname),
                        ErrorDetail::message(e.to_string()),
                    );
                    return CheckInEnd::Failed { iteration: i };
                }
            };
            match resp.classify(CHECKINS_EXHAUSTED) {
                Claim::Success => {
                    ui::success(&format!("Check-in {i} claimed"));
                    if i != max {
                        self.pause
                            .pause(self.settings.checkin_delay, "Waiting before the next check-in");
                    }
                }
                Claim::AlreadyDone => {
                    ui::success("No check-ins left today");
                    return CheckInEnd::Exhausted { claimed: i - 1 };
                }
                Claim::Failed => {
                    ui::error(&format!("Check-in {i} failed: {}", resp.describe()));
                    result.record(
                        format!("{}_checkin_{i}", result.nickname),
                        ErrorDetail::Response(resp.to_value()),
                    );
                    return CheckInEnd::Failed { iteration: i };
                }
            }
        }
        CheckInEnd::AllClaimed
    }

    fn report_vip_status(&mut self, cred: &Credential, result: &mut AccountResult) -> Result<(), ApiError> {
        ui::step("Fetching VIP expiry...");
        let detail = self.api.vip_detail(cred)?;
        if detail.is_success() {
            ui::detail(&format!("Today is: {}", self.date));
            ui::detail(&format!(
                "VIP expires: {}\n",
                detail.end_time().unwrap_or("unknown")
            ));
        } else {
            ui::error(&format!("Fetching VIP info failed: {}\n", detail.describe()));
            result.record(
                format!("{}_vip_details", result.nickname),
                ErrorDetail::Response(detail.to_value()),
            );
        }
        Ok(())
    }
}
