use super::timeline::YearMonth;
use super::types::{FilingStatus, Person};

// A married-filing-jointly household files single from January of the year
// after the earliest death onward. Any other starting status is fixed.
#[derive(Debug, Clone)]
pub struct FilingStatusTracker {
    initial_status: FilingStatus,
    first_death_year: Option<i32>,
}

impl FilingStatusTracker {
    pub fn new(people: &[Person], initial_status: FilingStatus) -> Self {
        let first_death_year = people
            .iter()
            .filter_map(Person::death_year_month)
            .map(YearMonth::year)
            .min();
        Self {
            initial_status,
            first_death_year,
        }
    }

    pub fn status_for(&self, month: YearMonth) -> FilingStatus {
        if self.initial_status != FilingStatus::MarriedFilingJointly {
            return self.initial_status;
        }
        match self.first_death_year {
            Some(death_year) if month.year() > death_year => FilingStatus::Single,
            _ => FilingStatus::MarriedFilingJointly,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timeline::Timeline;
    use chrono::NaiveDate;
    use proptest::prelude::{prop_assert_eq, proptest};

    fn ym(s: &str) -> YearMonth {
        s.parse().expect("valid month")
    }

    fn person(id: &str, birth_year: i32, birth_month: u32, life: Option<u32>) -> Person {
        Person {
            person_id: id.to_string(),
            name: id.to_string(),
            birth_date: NaiveDate::from_ymd_opt(birth_year, birth_month, 15).expect("valid date"),
            life_expectancy_years: life,
        }
    }

    #[test]
    fn switches_to_single_in_january_after_death_year() {
        // Death year-month 2030-04.
        let people = vec![person("a", 1950, 4, Some(80)), person("b", 1952, 9, None)];
        let tracker = FilingStatusTracker::new(&people, FilingStatus::MarriedFilingJointly);

        assert_eq!(tracker.status_for(ym("2030-03")), FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2030-05")), FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2030-12")), FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2031-01")), FilingStatus::Single);
        assert_eq!(tracker.status_for(ym("2045-07")), FilingStatus::Single);
    }

    #[test]
    fn earliest_death_drives_the_transition() {
        let people = vec![person("a", 1950, 4, Some(90)), person("b", 1955, 2, Some(70))];
        let tracker = FilingStatusTracker::new(&people, FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2025-12")), FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2026-01")), FilingStatus::Single);
    }

    #[test]
    fn no_death_dates_keeps_joint_status() {
        let people = vec![person("a", 1950, 4, None), person("b", 1952, 9, None)];
        let tracker = FilingStatusTracker::new(&people, FilingStatus::MarriedFilingJointly);
        assert_eq!(tracker.status_for(ym("2090-01")), FilingStatus::MarriedFilingJointly);
    }

    #[test]
    fn other_statuses_never_change() {
        let people = vec![person("a", 1950, 4, Some(70))];
        for status in [
            FilingStatus::Single,
            FilingStatus::HeadOfHousehold,
            FilingStatus::MarriedFilingSeparately,
        ] {
            let tracker = FilingStatusTracker::new(&people, status);
            assert_eq!(tracker.status_for(ym("2019-01")), status);
            assert_eq!(tracker.status_for(ym("2050-01")), status);
        }
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(48))]

        #[test]
        fn prop_joint_through_death_year_single_after(
            birth_year in 1940i32..1970,
            birth_month in 1u32..13,
            life in 60u32..100,
        ) {
            let people = vec![
                person("a", birth_year, birth_month, Some(life)),
                person("b", 1960, 1, None),
            ];
            let tracker = FilingStatusTracker::new(&people, FilingStatus::MarriedFilingJointly);
            let death_year = birth_year + life as i32;
            let timeline = Timeline::new(ym("2000-01"), 2070);
            for (month, _) in timeline.months() {
                let expected = if month.year() > death_year {
                    FilingStatus::Single
                } else {
                    FilingStatus::MarriedFilingJointly
                };
                prop_assert_eq!(tracker.status_for(month), expected);
            }
        }
    }
}
