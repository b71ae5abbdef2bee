//! Classify transport result codes into fetch outcomes.

use std::collections::BTreeSet;

use crate::config::CodeConfig;

/// What a completed transfer means for its task and its interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Body is handed to the success handler; task is removed.
    Success,
    /// Task is retried later or abandoned to the error file.
    Fail,
    /// Headers are handed to the redirect handler; task is removed.
    Redirect,
    /// Code matched no set: task is dropped without an error record.
    Discard,
}

/// Maps response codes to outcomes using three configurable sets, checked in
/// the order success, fail, redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    success: BTreeSet<u32>,
    fail: BTreeSet<u32>,
    redirect: BTreeSet<u32>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_codes(&CodeConfig::default())
    }
}

impl Classifier {
    pub fn from_codes(codes: &CodeConfig) -> Self {
        Self {
            success: codes.success.iter().copied().collect(),
            fail: codes.fail.iter().copied().collect(),
            redirect: codes.redirect.iter().copied().collect(),
        }
    }

    /// Classify a response code (0 = no HTTP response: timeout, DNS, refused).
    pub fn classify(&self, code: u32) -> Outcome {
        if self.success.contains(&code) {
            Outcome::Success
        } else if self.fail.contains(&code) {
            Outcome::Fail
        } else if self.redirect.contains(&code) {
            Outcome::Redirect
        } else {
            Outcome::Discard
        }
    }

    /// Also retry (and eventually record) this code.
    pub fn add_fail_code(&mut self, code: u32) {
        self.fail.insert(code);
    }
}
