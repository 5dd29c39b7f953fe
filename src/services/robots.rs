/// robots.txt 规则
///
/// 只支持 `User-agent` / `Allow` / `Disallow` 的前缀匹配；最长规则优先，长度相同时 Allow 优先。
use url::Url;

#[derive(Debug, Clone, Default)]
struct Group {
    agents: Vec<String>,
    rules: Vec<(bool, String)>,
}

/// 解析后的 robots.txt
#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    groups: Vec<Group>,
}

impl RobotsRules {
    pub fn parse(text: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut current = Group::default();
        let mut in_rules = false;

        for line in text.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    if in_rules {
                        groups.push(std::mem::take(&mut current));
                        in_rules = false;
                    }
                    current.agents.push(value.to_ascii_lowercase());
                }
                "allow" | "disallow" => {
                    in_rules = true;
                    if !current.agents.is_empty() {
                        current.rules.push((key == "allow", value.to_string()));
                    }
                }
                _ => {}
            }
        }
        if !current.agents.is_empty() {
            groups.push(current);
        }

        Self { groups }
    }

    /// 判断 `user_agent` 能否抓取 `url`
    pub fn is_allowed(&self, user_agent: &str, url: &str) -> bool {
        let product = user_agent
            .split(['/', ' '])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        let group = self
            .groups
            .iter()
            .find(|g| {
                !product.is_empty()
                    && g.agents.iter().any(|a| a != "*" && product.contains(a.as_str()))
            })
            .or_else(|| self.groups.iter().find(|g| g.agents.iter().any(|a| a == "*")));
        let Some(group) = group else {
            return true;
        };

        let path = match Url::parse(url) {
            Ok(u) => match u.query() {
                Some(q) => format!("{}?{}", u.path(), q),
                None => u.path().to_string(),
            },
            Err(_) => return true,
        };

        group
            .rules
            .iter()
            .filter(|(_, prefix)| !prefix.is_empty() && path.starts_with(prefix.as_str()))
            .max_by(|(allow_a, a), (allow_b, b)| a.len().cmp(&b.len()).then(allow_a.cmp(allow_b)))
            .map(|(allow, _)| *allow)
            .unwrap_or(true)
    }
}

/// 站点根目录下的 robots.txt 地址
pub fn robots_url(site_url: &str) -> Option<String> {
    let mut url = Url::parse(site_url).ok()?;
    url.set_path("/robots.txt");
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}
