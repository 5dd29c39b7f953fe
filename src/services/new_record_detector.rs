use crate::models::{CrossRunKey, DetailRecord, ListRecord};
use std::collections::HashSet;

/// 只保留 (标题, 日期) 不在已存储记录中的条目
///
/// 输入为空时直接返回，不读取已存储记录。
pub fn detect_new_records(fresh: Vec<ListRecord>, persisted: &[DetailRecord]) -> Vec<ListRecord> {
    if fresh.is_empty() {
        return fresh;
    }

    let known: HashSet<CrossRunKey> = persisted
        .iter()
        .filter(|r| r.is_valid())
        .map(DetailRecord::cross_run_key)
        .collect();

    fresh
        .into_iter()
        .filter(|r| !known.contains(&r.cross_run_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listed(title: &str, date: Option<&str>) -> ListRecord {
        ListRecord {
            title: title.into(),
            date: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_known_key_is_not_new() {
        let stored = vec![DetailRecord::from_list(
            &listed("Event X", Some("2024-05-01")),
            "2024-05-01 09:00:00",
        )];
        let out = detect_new_records(
            vec![
                listed("Event X", Some("2024-05-01")),
                listed("Event X", Some("2024-06-01")),
                listed("Event Y", None),
            ],
            &stored,
        );
        let keys: Vec<_> = out.iter().map(|r| (r.title.as_str(), r.date.as_deref())).collect();
        assert_eq!(keys, vec![("Event X", Some("2024-06-01")), ("Event Y", None)]);
    }

    #[test]
    fn test_title_match_is_exact() {
        let stored = vec![DetailRecord::from_list(&listed("Event X", None), "t")];
        let out = detect_new_records(vec![listed("Event X ", None)], &stored);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(detect_new_records(Vec::new(), &[]).is_empty());
    }
}
