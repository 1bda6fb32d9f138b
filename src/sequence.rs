use std::collections::BTreeMap;

use crate::domain::{AccountCode, Movement};

/// Groups movements by account, each group in chronological order.
///
/// The sort is stable on `(effective_at, id)`, so fully tied movements keep
/// the relative order in which they were supplied.
pub fn sequence<'a, I>(movements: I) -> BTreeMap<AccountCode, Vec<Movement>>
where
    I: IntoIterator<Item = &'a Movement>,
{
    let mut by_account: BTreeMap<AccountCode, Vec<Movement>> = BTreeMap::new();
    for m in movements {
        by_account
            .entry(m.account.clone())
            .or_default()
            .push(m.clone());
    }

    for items in by_account.values_mut() {
        sort_chronologically(items);
    }
    by_account
}

pub fn sort_chronologically(items: &mut [Movement]) {
    items.sort_by_key(Movement::sort_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::normalize::parse_date;
    use rust_decimal::Decimal;

    fn mv(account: &str, date: &str, id: i64, slip: &str) -> Movement {
        Movement {
            id,
            account: account.into(),
            account_name: None,
            effective_at: parse_date(date).unwrap(),
            direction: Direction::Increase,
            magnitude: Decimal::ONE,
            entry_no: None,
            slip_no: Some(slip.to_string()),
        }
    }

    #[test]
    fn groups_by_account() {
        let input = vec![
            mv("B", "2024-01-02", 1, "b1"),
            mv("A", "2024-01-01", 2, "a1"),
            mv("B", "2024-01-01", 3, "b2"),
        ];
        let groups = sequence(&input);
        assert_eq!(groups.len(), 2);
        let b: Vec<_> = groups[&AccountCode::from("B")]
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(b, vec![3, 1]);
    }

    #[test]
    fn same_date_orders_by_id_regardless_of_input_position() {
        let input = vec![
            mv("A", "2024-01-05", 9, "x"),
            mv("A", "2024-01-05", 3, "y"),
            mv("A", "2024-01-05", 5, "z"),
        ];
        let ids: Vec<_> = sequence(&input)[&AccountCode::from("A")]
            .iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec![3, 5, 9]);
    }

    #[test]
    fn full_ties_keep_input_order() {
        let input = vec![
            mv("A", "2024-01-05", 0, "first"),
            mv("A", "2024-01-05", 0, "second"),
            mv("A", "2024-01-05", 0, "third"),
        ];
        let slips: Vec<_> = sequence(&input)[&AccountCode::from("A")]
            .iter()
            .map(|m| m.slip_no.clone().unwrap())
            .collect();
        assert_eq!(slips, vec!["first", "second", "third"]);
    }
}
