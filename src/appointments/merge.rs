// src/appointments/merge.rs

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointments::segment::SegmentFilters;
use crate::models::Appointment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    ScheduledAt,
    PatientName,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<SortKey> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "scheduled_at" => Some(SortKey::ScheduledAt),
            "patient_name" => Some(SortKey::PatientName),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<SortOrder> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Union by id. Within `main` the first occurrence is kept; an entry in
/// `overrides` replaces the `main` entry with the same id in place.
pub fn merge_by_id(main: Vec<Appointment>, overrides: Vec<Appointment>) -> Vec<Appointment> {
    let mut out: Vec<Appointment> = Vec::with_capacity(main.len() + overrides.len());
    let mut pos: HashMap<Uuid, usize> = HashMap::new();

    for a in main {
        if !pos.contains_key(&a.id) {
            pos.insert(a.id, out.len());
            out.push(a);
        }
    }

    for b in overrides {
        match pos.get(&b.id) {
            Some(&i) => out[i] = b,
            None => {
                pos.insert(b.id, out.len());
                out.push(b);
            }
        }
    }

    out
}

pub fn retain_selected(items: &mut Vec<Appointment>, filters: &SegmentFilters) {
    items.retain(|a| filters.admits(a.status));
}

fn compare(a: &Appointment, b: &Appointment, key: SortKey) -> Ordering {
    let primary = match key {
        SortKey::ScheduledAt => a.scheduled_at.cmp(&b.scheduled_at),
        SortKey::PatientName => a
            .patient_name
            .to_lowercase()
            .cmp(&b.patient_name.to_lowercase())
            .then_with(|| a.scheduled_at.cmp(&b.scheduled_at)),
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Total order: the key, then `scheduled_at`, then id, so pages never overlap.
pub fn sort_appointments(items: &mut [Appointment], key: SortKey, order: SortOrder) {
    items.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// 1-based paging. A page past the end is pulled back to the last page.
pub fn paginate<T>(items: Vec<T>, page: u32, page_size: u32) -> PageSlice<T> {
    let page_size = page_size.max(1);
    let total = items.len() as u64;
    let total_pages = total_pages(total, page_size);
    let page = page.clamp(1, total_pages.max(1));

    let start = (page as usize - 1) * page_size as usize;
    let items: Vec<T> = items
        .into_iter()
        .skip(start)
        .take(page_size as usize)
        .collect();

    PageSlice {
        items,
        total,
        page,
        page_size,
        total_pages,
    }
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::eligibility::fixtures::{appt_named, at};
    use crate::appointments::status::AppointmentStatus;
    use proptest::prelude::*;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_override_replaces_in_place() {
        let when = at(2024, 6, 10, 9, 0);
        let a1 = appt_named(id(1), "A", AppointmentStatus::Scheduled, when);
        let a2 = appt_named(id(2), "B", AppointmentStatus::Scheduled, when);
        let b2 = appt_named(id(2), "B", AppointmentStatus::CheckedIn, when);
        let b3 = appt_named(id(3), "C", AppointmentStatus::InConsultation, at(2024, 6, 9, 10, 0));

        let merged = merge_by_id(vec![a1.clone(), a2], vec![b2.clone(), b3.clone()]);
        assert_eq!(merged, vec![a1, b2, b3]);
    }

    #[test]
    fn test_main_duplicates_collapse() {
        let when = at(2024, 6, 10, 9, 0);
        let first = appt_named(id(1), "A", AppointmentStatus::Scheduled, when);
        let dup = appt_named(id(1), "A", AppointmentStatus::CheckedIn, when);
        let merged = merge_by_id(vec![first.clone(), dup], vec![]);
        assert_eq!(merged, vec![first]);
    }

    #[test]
    fn test_sort_by_patient_name_case_insensitive() {
        let when = at(2024, 6, 10, 9, 0);
        let mut items = vec![
            appt_named(id(1), "zara", AppointmentStatus::Scheduled, when),
            appt_named(id(2), "Amit", AppointmentStatus::Scheduled, when),
            appt_named(id(3), "bina", AppointmentStatus::Scheduled, when),
        ];
        sort_appointments(&mut items, SortKey::PatientName, SortOrder::Asc);
        let names: Vec<&str> = items.iter().map(|a| a.patient_name.as_str()).collect();
        assert_eq!(names, vec!["Amit", "bina", "zara"]);

        sort_appointments(&mut items, SortKey::PatientName, SortOrder::Desc);
        let names: Vec<&str> = items.iter().map(|a| a.patient_name.as_str()).collect();
        assert_eq!(names, vec!["zara", "bina", "Amit"]);
    }

    #[test]
    fn test_sort_by_time_ties_broken_by_id() {
        let when = at(2024, 6, 10, 9, 0);
        let mut items = vec![
            appt_named(id(9), "X", AppointmentStatus::Scheduled, when),
            appt_named(id(4), "Y", AppointmentStatus::Scheduled, at(2024, 6, 10, 8, 0)),
            appt_named(id(2), "Z", AppointmentStatus::Scheduled, when),
        ];
        sort_appointments(&mut items, SortKey::ScheduledAt, SortOrder::Asc);
        let ids: Vec<Uuid> = items.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![id(4), id(2), id(9)]);
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=45).collect();

        let p = paginate(items.clone(), 1, 20);
        assert_eq!(p.items, (1..=20).collect::<Vec<_>>());
        assert_eq!(p.total, 45);
        assert_eq!(p.total_pages, 3);

        let p = paginate(items.clone(), 3, 20);
        assert_eq!(p.items, (41..=45).collect::<Vec<_>>());

        let p = paginate(items, 9, 20);
        assert_eq!(p.page, 3);
        assert_eq!(p.items.len(), 5);

        let empty: PageSlice<u32> = paginate(vec![], 4, 20);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 0);
        assert!(empty.items.is_empty());
    }

    fn any_appts(max_id: u128) -> impl Strategy<Value = Vec<Appointment>> {
        let status = prop::sample::select(AppointmentStatus::ALL.to_vec());
        prop::collection::vec((1..=max_id, status, 0u32..48), 0..30).prop_map(|rows| {
            rows.into_iter()
                .map(|(n, st, h)| {
                    appt_named(id(n), "P", st, at(2024, 6, 8, 0, 0) + chrono::Duration::hours(h.into()))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_merge_with_empty_override_is_deduplicated_main(main in any_appts(10)) {
            let merged = merge_by_id(main.clone(), vec![]);

            let mut expected: Vec<Appointment> = Vec::new();
            for a in main {
                if !expected.iter().any(|e| e.id == a.id) {
                    expected.push(a);
                }
            }
            prop_assert_eq!(merged, expected);
        }

        #[test]
        fn prop_override_status_wins(main in any_appts(10), overrides in any_appts(10)) {
            let merged = merge_by_id(main.clone(), overrides.clone());

            let ids: std::collections::HashSet<Uuid> = merged.iter().map(|a| a.id).collect();
            prop_assert_eq!(ids.len(), merged.len());

            for m in &merged {
                if let Some(last_b) = overrides.iter().rev().find(|b| b.id == m.id) {
                    prop_assert_eq!(m.status, last_b.status);
                }
            }
        }

        #[test]
        fn prop_pages_partition_the_list(len in 0usize..120, page_size in 1u32..30) {
            let items: Vec<usize> = (0..len).collect();
            let pages = total_pages(len as u64, page_size);
            let mut seen = Vec::new();
            for page in 1..=pages {
                seen.extend(paginate(items.clone(), page, page_size).items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
