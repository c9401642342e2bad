mod common;

use common::{empty_return, AmountForm, PerPersonForm, PlainForm};
use proptest::prelude::*;
use taxform_engine::{AccumulatorLine, LineMap, Owner, Person};

fn owner_strategy() -> impl Strategy<Value = u8> {
    0u8..4
}

fn owner_for(code: u8, taxpayer: &Person, spouse: &Person) -> Owner {
    match code {
        0 => Owner::Everyone,
        1 => Owner::Person(taxpayer.clone()),
        2 => Owner::Person(spouse.clone()),
        _ => Owner::Joint,
    }
}

proptest! {
    #[test]
    fn accumulator_sums_every_copy(cents in prop::collection::vec(0i64..10_000_000, 0..12)) {
        let mut tr = empty_return();
        for amount in &cents {
            tr.add_form(AmountForm::new(*amount as f64 / 100.0)).unwrap();
        }
        tr.add_form(PlainForm::new(
            "Total",
            LineMap::new().with("1", AccumulatorLine::<AmountForm>::new("g")),
        ))
        .unwrap();

        let expected = cents
            .iter()
            .fold(0.0, |total, amount| total + *amount as f64 / 100.0);
        let total = tr.value_as::<PlainForm, f64>("1").unwrap();
        prop_assert_eq!(total, expected);
    }

    #[test]
    fn visible_forms_follow_the_roster(
        owners in prop::collection::vec(owner_strategy(), 0..16),
        with_taxpayer in any::<bool>(),
        with_spouse in any::<bool>(),
        joint in any::<bool>(),
    ) {
        let taxpayer = Person::taxpayer("Billy Bob");
        let spouse = Person::spouse("Jilly Bob");

        let mut tr = empty_return();
        tr.set_joint_form_policy(joint);
        if with_taxpayer {
            tr.add_person(taxpayer.clone()).unwrap();
        }
        if with_spouse {
            tr.add_person(spouse.clone()).unwrap();
        }
        for code in &owners {
            tr.add_form(PerPersonForm::new(owner_for(*code, &taxpayer, &spouse))).unwrap();
        }

        let expected = owners
            .iter()
            .filter(|code| match **code {
                0 => true,
                1 => with_taxpayer,
                2 => with_spouse,
                _ => joint,
            })
            .count();
        prop_assert_eq!(tr.find_forms::<PerPersonForm>().len(), expected);
    }

    #[test]
    fn get_person_matches_exact_names(first in "[A-Z][a-z]{2,8}", second in "[A-Z][a-z]{2,8}") {
        prop_assume!(!first.contains(&second) && !second.contains(&first));

        let mut tr = empty_return();
        tr.add_person(Person::taxpayer(first.clone())).unwrap();
        tr.add_person(Person::spouse(second.clone())).unwrap();

        prop_assert_eq!(tr.get_person(&first).unwrap().name(), first.as_str());
        prop_assert_eq!(tr.get_person(&second).unwrap().name(), second.as_str());
        prop_assert!(tr.get_person("").is_err());
    }
}
