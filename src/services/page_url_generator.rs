/// 分页 URL 生成
///
/// 每页一个 URL：`{scheme}://{host}{path}?{query}`。`spid` 在所有页上保留；
/// 默认策略下第 1 页只带 `spid`，从第 2 页起带 `{page_param}={n}` 再加 `spid`。
use crate::error::FetchError;
use crate::models::FirstPagePolicy;
use tracing::{info, warn};
use url::{form_urlencoded, Url};

/// 生成第 1 页到第 `total_pages` 页的 URL
///
/// `page_param_override` 优先于分析得到的参数名。没有 `spid` 时第 1 页一律显式带页码。
pub fn generate_page_urls(
    url: &str,
    total_pages: u32,
    inferred_page_param: &str,
    page_param_override: Option<&str>,
    first_page: FirstPagePolicy,
) -> Result<Vec<String>, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| FetchError::InvalidUrl(format!("{}: 缺少主机名", url)))?;
    let base = match parsed.port() {
        Some(port) => format!("{}://{}:{}{}", parsed.scheme(), host, port, parsed.path()),
        None => format!("{}://{}{}", parsed.scheme(), host, parsed.path()),
    };

    let spid = parsed
        .query_pairs()
        .find(|(k, _)| k == "spid")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty());
    if spid.is_none() {
        warn!("URL 中没有 spid 参数，分页可能不准确: {}", url);
    }

    let page_param = page_param_override
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(inferred_page_param);

    let urls: Vec<String> = (1..=total_pages.max(1))
        .map(|page| {
            let mut query = form_urlencoded::Serializer::new(String::new());
            let omit_page = page == 1 && first_page == FirstPagePolicy::Omit && spid.is_some();
            if !omit_page {
                query.append_pair(page_param, &page.to_string());
            }
            if let Some(spid) = &spid {
                query.append_pair("spid", spid);
            }
            format!("{}?{}", base, query.finish())
        })
        .collect();

    info!(
        "生成 {} 个分页 URL: {:?}...",
        urls.len(),
        urls.iter().take(2).collect::<Vec<_>>()
    );
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spid_preserved_and_page_one_omits_param() {
        let urls = generate_page_urls(
            "https://site/x.aspx?spid=XYZ",
            3,
            "pg",
            None,
            FirstPagePolicy::Omit,
        )
        .unwrap();
        assert_eq!(
            urls,
            vec![
                "https://site/x.aspx?spid=XYZ",
                "https://site/x.aspx?pg=2&spid=XYZ",
                "https://site/x.aspx?pg=3&spid=XYZ",
            ]
        );
    }

    #[test]
    fn test_override_param_and_explicit_first_page() {
        let urls = generate_page_urls(
            "https://site:8080/list?spid=A&pg=7",
            2,
            "pg",
            Some("page"),
            FirstPagePolicy::Explicit,
        )
        .unwrap();
        assert_eq!(
            urls,
            vec![
                "https://site:8080/list?page=1&spid=A",
                "https://site:8080/list?page=2&spid=A",
            ]
        );
    }

    #[test]
    fn test_without_spid_first_page_is_explicit() {
        let urls =
            generate_page_urls("https://site/news", 2, "pg", None, FirstPagePolicy::Omit).unwrap();
        assert_eq!(urls, vec!["https://site/news?pg=1", "https://site/news?pg=2"]);
    }

    #[test]
    fn test_invalid_url_is_error() {
        let err = generate_page_urls("not a url", 2, "pg", None, FirstPagePolicy::Omit).unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
