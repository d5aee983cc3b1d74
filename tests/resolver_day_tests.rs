use chrono::NaiveTime;
use class_schedule::{PeriodDraft, Schedule, TimeOfDay};

fn school_day() -> Schedule {
    let mut schedule = Schedule::new("Weekday").unwrap();
    for (name, start, end) in [
        ("Lunch", "12:00", "12:45"),
        ("Homeroom", "07:50", "08:00"),
        ("Math", "08:00", "09:00"),
        ("Science", "09:10", "10:00"),
        ("Study Hall", "09:30", "11:00"),
        ("History", "13:00", "14:30"),
    ] {
        schedule
            .add_period(&PeriodDraft::new(name, start, end))
            .unwrap();
    }
    schedule
}

#[test]
fn every_minute_of_the_day_resolves_consistently() {
    let schedule = school_day();
    let sorted = schedule.sorted_periods();

    for minute in 0..24 * 60 {
        let now = NaiveTime::from_hms_opt(minute / 60, minute % 60, 30).unwrap();
        let tod = TimeOfDay::from_naive_time(now);
        let resolution = schedule.resolve(now);

        match resolution.active {
            Some(active) => {
                assert!(active.contains(tod), "{active:?} does not hold {tod}");
                let first_match = sorted.iter().find(|p| p.contains(tod)).unwrap();
                assert_eq!(active.id, first_match.id, "earliest match must win at {tod}");
                let idx = sorted.iter().position(|p| p.id == active.id).unwrap();
                assert_eq!(
                    resolution.next.map(|p| &p.id),
                    sorted.get(idx + 1).map(|p| &p.id),
                    "next must follow active at {tod}"
                );
            }
            None => {
                assert!(sorted.iter().all(|p| !p.contains(tod)));
                let expected = sorted.iter().find(|p| tod < p.start_time);
                assert_eq!(resolution.next.map(|p| &p.id), expected.map(|p| &p.id));
            }
        }
    }
}

#[test]
fn overlapping_study_hall_is_shadowed_until_science_ends() {
    let schedule = school_day();
    let at = |h, m| schedule.resolve(NaiveTime::from_hms_opt(h, m, 0).unwrap());

    assert_eq!(at(9, 45).active.unwrap().name, "Science");
    assert_eq!(at(9, 45).next.unwrap().name, "Study Hall");
    assert_eq!(at(10, 0).active.unwrap().name, "Study Hall");
    assert_eq!(at(11, 30).active, None);
    assert_eq!(at(11, 30).next.unwrap().name, "Lunch");
    assert_eq!(at(15, 0).active, None);
    assert_eq!(at(15, 0).next, None);
}
