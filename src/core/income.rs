use std::collections::BTreeMap;

use super::timeline::YearMonth;
use super::types::{IncomeStream, IncomeStreamType};

#[derive(Debug, Clone)]
struct IncomeState {
    current_amount: f64,
    last_cola_year: Option<i32>,
}

impl IncomeState {
    fn new(stream: &IncomeStream) -> Self {
        Self {
            current_amount: stream.monthly_amount_at_start,
            last_cola_year: None,
        }
    }

    fn apply_cola_if_due(&mut self, stream: &IncomeStream, month: YearMonth) {
        if !month.is_month(stream.cola_month) {
            return;
        }
        if self.last_cola_year == Some(month.year()) {
            return;
        }
        if stream.cola_percent_annual > 0.0 {
            self.current_amount *= 1.0 + stream.cola_percent_annual;
            self.last_cola_year = Some(month.year());
        }
    }
}

#[derive(Debug, Clone)]
pub struct IncomeProcessor<'a> {
    streams: &'a [IncomeStream],
    states: Vec<IncomeState>,
}

impl<'a> IncomeProcessor<'a> {
    pub fn new(streams: &'a [IncomeStream]) -> Self {
        Self {
            streams,
            states: streams.iter().map(IncomeState::new).collect(),
        }
    }

    pub fn process_month(&mut self, month: YearMonth) -> BTreeMap<String, f64> {
        let mut income_by_stream = BTreeMap::new();
        for (stream, state) in self.streams.iter().zip(self.states.iter_mut()) {
            if !stream.is_active(month) {
                income_by_stream.insert(stream.stream_id.clone(), 0.0);
                continue;
            }
            state.apply_cola_if_due(stream, month);
            income_by_stream.insert(stream.stream_id.clone(), state.current_amount);
        }
        income_by_stream
    }

    pub fn total_income(&self, income_by_stream: &BTreeMap<String, f64>) -> f64 {
        income_by_stream.values().sum()
    }

    pub fn income_by_type(
        &self,
        income_by_stream: &BTreeMap<String, f64>,
    ) -> BTreeMap<IncomeStreamType, f64> {
        let mut by_type = BTreeMap::new();
        for stream in self.streams {
            let amount = income_by_stream
                .get(&stream.stream_id)
                .copied()
                .unwrap_or(0.0);
            *by_type.entry(stream.stream_type).or_insert(0.0) += amount;
        }
        by_type
    }

    pub fn social_security_income(&self, income_by_stream: &BTreeMap<String, f64>) -> f64 {
        self.streams
            .iter()
            .filter(|s| s.stream_type == IncomeStreamType::SocialSecurity)
            .filter_map(|s| income_by_stream.get(&s.stream_id))
            .sum()
    }

    pub fn current_amounts(&self) -> BTreeMap<String, f64> {
        self.streams
            .iter()
            .zip(self.states.iter())
            .map(|(stream, state)| (stream.stream_id.clone(), state.current_amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::Timeline;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    fn ym(s: &str) -> YearMonth {
        s.parse().expect("valid month")
    }

    fn stream(id: &str, kind: IncomeStreamType, amount: f64, cola: f64, cola_month: u32) -> IncomeStream {
        IncomeStream {
            stream_id: id.to_string(),
            stream_type: kind,
            owner_person_id: "p1".to_string(),
            start_month: ym("2026-01"),
            end_month: None,
            monthly_amount_at_start: amount,
            cola_percent_annual: cola,
            cola_month,
        }
    }

    #[test]
    fn cola_applies_in_cola_month_before_payment() {
        let streams = vec![stream("pension", IncomeStreamType::Pension, 1000.0, 0.02, 5)];
        let mut processor = IncomeProcessor::new(&streams);

        assert_approx(processor.process_month(ym("2026-04"))["pension"], 1000.0);
        assert_approx(processor.process_month(ym("2026-05"))["pension"], 1020.0);
        assert_approx(processor.process_month(ym("2026-06"))["pension"], 1020.0);
    }

    #[test]
    fn cola_is_not_reapplied_within_the_same_year() {
        let streams = vec![stream("pension", IncomeStreamType::Pension, 1000.0, 0.02, 5)];
        let mut processor = IncomeProcessor::new(&streams);

        processor.process_month(ym("2026-05"));
        processor.process_month(ym("2026-05"));
        assert_approx(processor.current_amounts()["pension"], 1020.0);
    }

    #[test]
    fn cola_compounds_across_years() {
        let streams = vec![stream("pension", IncomeStreamType::Pension, 1000.0, 0.03, 1)];
        let mut processor = IncomeProcessor::new(&streams);

        assert_approx(processor.process_month(ym("2026-01"))["pension"], 1030.0);
        assert_approx(processor.process_month(ym("2027-01"))["pension"], 1060.9);
        assert_approx(processor.process_month(ym("2028-01"))["pension"], 1092.727);
    }

    #[test]
    fn income_is_zero_outside_active_window_and_skips_cola() {
        let mut s = stream("salary", IncomeStreamType::Salary, 8000.0, 0.05, 3);
        s.start_month = ym("2026-04");
        s.end_month = Some(ym("2027-02"));
        let streams = vec![s];
        let mut processor = IncomeProcessor::new(&streams);

        assert_eq!(processor.process_month(ym("2026-03"))["salary"], 0.0);
        assert_approx(processor.process_month(ym("2026-04"))["salary"], 8000.0);
        assert_approx(processor.process_month(ym("2027-02"))["salary"], 8000.0);
        // 2027-03 is the COLA month but the stream has ended.
        assert_eq!(processor.process_month(ym("2027-03"))["salary"], 0.0);
        assert_approx(processor.current_amounts()["salary"], 8000.0);
    }

    #[test]
    fn groups_income_by_type_and_isolates_social_security() {
        let streams = vec![
            stream("pension", IncomeStreamType::Pension, 5000.0, 0.0, 1),
            stream("ssa_a", IncomeStreamType::SocialSecurity, 2500.0, 0.0, 1),
            stream("ssa_b", IncomeStreamType::SocialSecurity, 1500.0, 0.0, 1),
        ];
        let mut processor = IncomeProcessor::new(&streams);
        let income = processor.process_month(ym("2026-02"));

        assert_approx(processor.total_income(&income), 9000.0);
        assert_approx(processor.social_security_income(&income), 4000.0);
        let by_type = processor.income_by_type(&income);
        assert_approx(by_type[&IncomeStreamType::Pension], 5000.0);
        assert_approx(by_type[&IncomeStreamType::SocialSecurity], 4000.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_cola_applies_once_per_year_in_cola_month(
            amount in 1u32..20_000,
            cola_bp in 0u32..500,
            cola_month in 1u32..13,
            years in 1i32..6,
        ) {
            let cola = f64::from(cola_bp) / 10_000.0;
            let streams = vec![stream("s", IncomeStreamType::Pension, f64::from(amount), cola, cola_month)];
            let mut processor = IncomeProcessor::new(&streams);
            let timeline = Timeline::new(ym("2026-01"), 2025 + years);

            let mut previous = f64::from(amount);
            for (month, number) in timeline.months() {
                let paid = processor.process_month(month)["s"];
                if number == cola_month {
                    let years_elapsed = month.year() - 2026 + 1;
                    let expected = f64::from(amount) * (1.0 + cola).powi(years_elapsed);
                    prop_assert!((paid - expected).abs() <= expected * EPS + EPS);
                } else {
                    prop_assert!((paid - previous).abs() <= EPS);
                }
                previous = paid;
            }
        }
    }
}
