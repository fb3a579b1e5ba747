//! Payload shape checks.
//!
//! Everything here is a pure function of the request body: no store access.
//! Each check adds its complaints to a [`Report`], so a client gets every
//! problem with a payload in one response. Whether the referenced rows exist
//! is decided later by the engine, inside its transaction.

use std::collections::BTreeMap;

use api_types::{account, auth, category, record, user};
use engine::MoneyCents;
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::ServerError;

/// Field name → messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const NAME_MAX_LEN: usize = 80;
const REQUIRED: &str = "Missing data for required field.";

#[derive(Default)]
struct Report(FieldErrors);

impl Report {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn required<T: Copy>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, REQUIRED);
        }
        value
    }

    fn name(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let Some(value) = value else {
            self.push(field, REQUIRED);
            return None;
        };
        let trimmed = value.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > NAME_MAX_LEN {
            self.push(field, format!("Length must be between 1 and {NAME_MAX_LEN}."));
            return None;
        }
        Some(trimmed.to_string())
    }

    fn money(&mut self, field: &str, value: Decimal, sign: Sign) -> Option<MoneyCents> {
        let Some(cents) = to_cents(value) else {
            self.push(field, "Must be a number with at most two decimal places.");
            return None;
        };
        let fits = match sign {
            Sign::Positive => cents.is_positive(),
            Sign::NonNegative => !cents.is_negative(),
        };
        if !fits {
            self.push(field, sign.message());
            return None;
        }
        Some(cents)
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ServerError> {
        match value {
            Some(value) if self.0.is_empty() => Ok(value),
            _ => Err(ServerError::Validation(self.0)),
        }
    }
}

#[derive(Clone, Copy)]
enum Sign {
    Positive,
    NonNegative,
}

impl Sign {
    fn message(self) -> &'static str {
        match self {
            Self::Positive => "Must be greater than 0.",
            Self::NonNegative => "Must be greater than or equal to 0.",
        }
    }
}

/// Exact conversion to cents. `None` past two decimals or out of range.
pub(crate) fn to_cents(value: Decimal) -> Option<MoneyCents> {
    let scaled = value.checked_mul(Decimal::ONE_HUNDRED)?;
    if !scaled.fract().is_zero() {
        return None;
    }
    scaled.to_i64().map(MoneyCents::new)
}

pub(crate) fn to_decimal(value: MoneyCents) -> Decimal {
    Decimal::new(value.cents(), 2)
}

pub(crate) fn user_new(payload: &user::UserNew) -> Result<(String, Option<String>), ServerError> {
    let mut report = Report::default();
    let name = report.name("name", payload.name.as_deref());
    if payload.password.as_deref().is_some_and(str::is_empty) {
        report.push("password", "Must not be empty.");
    }
    report.finish(name.map(|name| (name, payload.password.clone())))
}

pub(crate) fn account_new(payload: &account::AccountNew) -> Result<(i64, MoneyCents), ServerError> {
    let mut report = Report::default();
    let user_id = report.required("user_id", payload.user_id);
    let balance = match payload.initial_balance {
        Some(value) => report.money("initial_balance", value, Sign::NonNegative),
        None => Some(MoneyCents::ZERO),
    };
    report.finish(user_id.zip(balance))
}

pub(crate) fn deposit(payload: &account::Deposit) -> Result<MoneyCents, ServerError> {
    let mut report = Report::default();
    let amount = report
        .required("amount", payload.amount)
        .and_then(|value| report.money("amount", value, Sign::Positive));
    report.finish(amount)
}

pub(crate) fn category_new(payload: &category::CategoryNew) -> Result<String, ServerError> {
    let mut report = Report::default();
    let name = report.name("name", payload.name.as_deref());
    report.finish(name)
}

pub(crate) fn record_new(
    payload: &record::RecordNew,
) -> Result<(i64, i64, MoneyCents), ServerError> {
    let mut report = Report::default();
    let user_id = report.required("user_id", payload.user_id);
    let category_id = report.required("category_id", payload.category_id);
    let amount = report
        .required("amount", payload.amount)
        .and_then(|value| report.money("amount", value, Sign::Positive));
    report.finish(
        user_id
            .zip(category_id)
            .zip(amount)
            .map(|((user_id, category_id), amount)| (user_id, category_id, amount)),
    )
}

pub(crate) fn login(payload: &auth::Login) -> Result<(String, String), ServerError> {
    let mut report = Report::default();
    let name = report.name("name", payload.name.as_deref());
    let password = match payload.password.as_deref() {
        None | Some("") => {
            report.push("password", REQUIRED);
            None
        }
        Some(password) => Some(password.to_string()),
    };
    report.finish(name.zip(password))
}
