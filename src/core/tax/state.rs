use serde::Serialize;

use super::{Bracket, progressive_tax};
use crate::core::types::FilingStatus;

const NO_INCOME_TAX_STATES: [&str; 9] = ["AK", "FL", "NV", "NH", "SD", "TN", "TX", "WA", "WY"];

const FLAT_RATES: [(&str, f64); 9] = [
    ("AZ", 0.025),
    ("CO", 0.044),
    ("IL", 0.0495),
    ("IN", 0.0323),
    ("MA", 0.05),
    ("MI", 0.0425),
    ("NC", 0.0475),
    ("PA", 0.0307),
    ("UT", 0.0485),
];

pub const DEFAULT_STATE_RATE: f64 = 0.05;

const CA_SINGLE: [Bracket; 9] = [
    Bracket::new(10_756.0, 0.01),
    Bracket::new(25_499.0, 0.02),
    Bracket::new(40_245.0, 0.04),
    Bracket::new(55_866.0, 0.06),
    Bracket::new(70_606.0, 0.08),
    Bracket::new(360_659.0, 0.093),
    Bracket::new(432_787.0, 0.103),
    Bracket::new(721_314.0, 0.113),
    Bracket::new(f64::INFINITY, 0.123),
];

const CA_JOINT: [Bracket; 9] = [
    Bracket::new(21_512.0, 0.01),
    Bracket::new(50_998.0, 0.02),
    Bracket::new(80_490.0, 0.04),
    Bracket::new(111_732.0, 0.06),
    Bracket::new(141_212.0, 0.08),
    Bracket::new(721_318.0, 0.093),
    Bracket::new(865_574.0, 0.103),
    Bracket::new(1_442_628.0, 0.113),
    Bracket::new(f64::INFINITY, 0.123),
];

const NY_SINGLE: [Bracket; 9] = [
    Bracket::new(8_500.0, 0.04),
    Bracket::new(11_700.0, 0.045),
    Bracket::new(13_900.0, 0.0525),
    Bracket::new(80_650.0, 0.055),
    Bracket::new(215_400.0, 0.06),
    Bracket::new(1_077_550.0, 0.0685),
    Bracket::new(5_000_000.0, 0.0965),
    Bracket::new(25_000_000.0, 0.103),
    Bracket::new(f64::INFINITY, 0.109),
];

const NY_JOINT: [Bracket; 9] = [
    Bracket::new(17_150.0, 0.04),
    Bracket::new(23_600.0, 0.045),
    Bracket::new(27_900.0, 0.0525),
    Bracket::new(161_550.0, 0.055),
    Bracket::new(323_200.0, 0.06),
    Bracket::new(2_155_350.0, 0.0685),
    Bracket::new(5_000_000.0, 0.0965),
    Bracket::new(25_000_000.0, 0.103),
    Bracket::new(f64::INFINITY, 0.109),
];

fn normalize(state: &str) -> String {
    state.trim().to_ascii_uppercase()
}

pub fn is_no_income_tax_state(state: &str) -> bool {
    NO_INCOME_TAX_STATES.contains(&normalize(state).as_str())
}

pub fn state_brackets(state: &str, status: FilingStatus) -> Option<&'static [Bracket]> {
    let joint = status == FilingStatus::MarriedFilingJointly;
    match (normalize(state).as_str(), joint) {
        ("CA", false) => Some(&CA_SINGLE),
        ("CA", true) => Some(&CA_JOINT),
        ("NY", false) => Some(&NY_SINGLE),
        ("NY", true) => Some(&NY_JOINT),
        _ => None,
    }
}

pub fn state_tax_rate(state: &str) -> f64 {
    let code = normalize(state);
    if NO_INCOME_TAX_STATES.contains(&code.as_str()) {
        return 0.0;
    }
    if matches!(code.as_str(), "CA" | "NY") {
        return 0.0;
    }
    FLAT_RATES
        .iter()
        .find(|(listed, _)| *listed == code)
        .map(|(_, rate)| *rate)
        .unwrap_or(DEFAULT_STATE_RATE)
}

pub fn state_tax(agi: f64, state: &str, status: FilingStatus) -> f64 {
    if agi <= 0.0 || is_no_income_tax_state(state) {
        return 0.0;
    }
    match state_brackets(state, status) {
        Some(brackets) => progressive_tax(agi, brackets),
        None => agi * state_tax_rate(state),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateTaxSummary {
    pub state: String,
    pub no_income_tax: bool,
    pub progressive: bool,
    pub flat_rate: f64,
    pub taxable_income: f64,
    pub state_tax: f64,
    pub effective_rate: f64,
}

pub fn state_tax_summary(agi: f64, state: &str, status: FilingStatus) -> StateTaxSummary {
    let tax = state_tax(agi, state, status);
    StateTaxSummary {
        state: normalize(state),
        no_income_tax: is_no_income_tax_state(state),
        progressive: state_brackets(state, status).is_some(),
        flat_rate: state_tax_rate(state),
        taxable_income: agi.max(0.0),
        state_tax: tax,
        effective_rate: if agi > 0.0 { tax / agi } else { 0.0 },
    }
}
