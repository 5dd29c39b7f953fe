use crate::models::ListRecord;
use std::collections::HashSet;
use tracing::debug;

/// 合并多页结果，按页内标识去重
///
/// 一条记录只有在 `nid` 与 `hash` 都未出现过时才保留；两者都缺失的记录无法确定身份，直接丢弃。
/// 保持首次出现的顺序。
pub fn deduplicate(records: Vec<ListRecord>) -> Vec<ListRecord> {
    let input = records.len();
    let mut seen_nids: HashSet<String> = HashSet::new();
    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        let nid = record.nid.as_deref().filter(|s| !s.is_empty());
        let hash = record.hash.as_deref().filter(|s| !s.is_empty());
        if nid.is_none() && hash.is_none() {
            continue;
        }
        if nid.is_some_and(|n| seen_nids.contains(n)) || hash.is_some_and(|h| seen_hashes.contains(h)) {
            continue;
        }
        if let Some(n) = nid {
            seen_nids.insert(n.to_string());
        }
        if let Some(h) = hash {
            seen_hashes.insert(h.to_string());
        }
        unique.push(record);
    }

    debug!("去重: {} -> {} 条", input, unique.len());
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, nid: Option<&str>) -> ListRecord {
        ListRecord {
            title: title.to_string(),
            nid: nid.map(str::to_string),
            ..Default::default()
        }
        .with_content_hash()
    }

    #[test]
    fn test_same_nid_kept_once() {
        let out = deduplicate(vec![
            record("first", Some("AB12")),
            record("other", Some("CD34")),
            record("renamed", Some("AB12")),
        ]);
        let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "other"]);
    }

    #[test]
    fn test_same_content_without_nid_kept_once() {
        let out = deduplicate(vec![record("a", None), record("a", None), record("b", None)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_records_without_identifiers_are_dropped() {
        let bare = ListRecord {
            title: "no id".into(),
            ..Default::default()
        };
        assert!(deduplicate(vec![bare]).is_empty());
    }
}
