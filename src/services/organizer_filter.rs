use crate::models::{DetailRecord, SiteConfig};
use phf::phf_set;
use tracing::{debug, info};

/// 内置主办单位白名单
static DEFAULT_ALLOWED_ORGANIZERS: phf::Set<&'static str> = phf_set! {
    "教師教學發展中心",
    "教發中心",
};

/// 默认启用白名单的站点
const DEFAULT_FILTERED_SITE: &str =
    "https://sprout.tku.edu.tw/DeepNews.aspx?spid=76E2C6DA-A2BA-410D-8BA0-CBFB22C84AEA";

/// 按主办单位过滤
///
/// 站点配置了 `organizer_allow_list` 时使用该名单；否则只有默认站点套用内置名单，
/// 其他站点原样返回。
pub fn filter_by_organizer(records: Vec<DetailRecord>, site: &SiteConfig) -> Vec<DetailRecord> {
    let allowed = |organizer: &str| match &site.organizer_allow_list {
        Some(list) => list.iter().any(|a| a == organizer),
        None => DEFAULT_ALLOWED_ORGANIZERS.contains(organizer),
    };

    if site.organizer_allow_list.is_none() && site.url != DEFAULT_FILTERED_SITE {
        debug!("站点 {} 不需要过滤主办单位", site.name);
        return records;
    }

    let before = records.len();
    let kept: Vec<DetailRecord> = records
        .into_iter()
        .filter(|r| r.organizer.as_deref().is_some_and(|o| allowed(o)))
        .collect();
    info!("主办单位过滤: {} -> {} 条", before, kept.len());
    kept
}
