//! Release index scraping.
//!
//! All pattern matching on the download server's HTML lives here; the rest of
//! the crate only sees [`ReleaseRecord`]s.

use chrono::NaiveDateTime;
use regex::Regex;

/// One published release found in an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    /// Version text exactly as it appears in the file name. It may not parse
    /// as `X.Y.Z` (release candidates, sibling projects); the resolver decides.
    pub version: String,
    pub date: Option<NaiveDateTime>,
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M", "%d-%b-%Y %H:%M"];

/// Extract `<package>-<version>.tar.*` anchors and their publish dates.
///
/// Both Apache (`2020-03-23 10:49`) and nginx (`23-Mar-2020 10:49`) listing
/// date styles are understood. Each version is reported once, in page order,
/// carrying the first date seen for any of its files.
pub fn parse_listing(package: &str, html: &str) -> Vec<ReleaseRecord> {
    let anchor = match Regex::new(&format!(
        r#"href="(?:[^"]*/)?{}-(\d[^"/]*?)\.tar(?:\.[A-Za-z0-9]+)?""#,
        regex::escape(package)
    )) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let date = match Regex::new(
        r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}|\d{2}-[A-Z][a-z]{2}-\d{4} \d{2}:\d{2}",
    ) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut records: Vec<ReleaseRecord> = Vec::new();
    for line in html.lines() {
        for caps in anchor.captures_iter(line) {
            let (Some(whole), Some(version)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let published = date
                .find(&line[whole.end()..])
                .and_then(|m| parse_date(m.as_str()));

            match records.iter_mut().find(|r| r.version == version.as_str()) {
                Some(existing) => {
                    if existing.date.is_none() {
                        existing.date = published;
                    }
                }
                None => records.push(ReleaseRecord {
                    version: version.as_str().to_string(),
                    date: published,
                }),
            }
        }
    }
    records
}

fn parse_date(text: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

/// Publish date of `version`, if the index showed one.
pub fn release_date(records: &[ReleaseRecord], version: &str) -> Option<NaiveDateTime> {
    records
        .iter()
        .find(|r| r.version == version)
        .and_then(|r| r.date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const APACHE: &str = r#"<html><body><table>
<tr><th><a href="?C=N;O=D">Name</a></th><th><a href="?C=M;O=A">Last modified</a></th></tr>
<tr><td><a href="/pub/">Parent Directory</a></td><td>&nbsp;</td></tr>
<tr><td><img src="/icons/compressed.gif" alt="[   ]"></td><td><a href="talloc-2.3.0.tar.asc">talloc-2.3.0.tar.asc</a></td><td align="right">2019-10-14 11:02  </td><td align="right">833 </td></tr>
<tr><td><img src="/icons/compressed.gif" alt="[   ]"></td><td><a href="talloc-2.3.0.tar.gz">talloc-2.3.0.tar.gz</a></td><td align="right">2019-10-14 11:02  </td><td align="right">645K</td></tr>
<tr><td><img src="/icons/compressed.gif" alt="[   ]"></td><td><a href="talloc-2.3.1.tar.gz">talloc-2.3.1.tar.gz</a></td><td align="right">2019-11-21 09:15  </td><td align="right">646K</td></tr>
<tr><td><img src="/icons/compressed.gif" alt="[   ]"></td><td><a href="talloc-tools-1.0.tar.gz">talloc-tools-1.0.tar.gz</a></td><td align="right">2018-01-01 00:00  </td></tr>
<tr><td><img src="/icons/text.gif" alt="[TXT]"></td><td><a href="README">README</a></td><td align="right">2010-01-01 00:00  </td></tr>
</table></body></html>"#;

    #[test]
    fn test_parse_apache_listing() {
        let records = parse_listing("talloc", APACHE);
        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["2.3.0", "2.3.1"]);
        assert_eq!(
            records[1].date,
            Some(
                NaiveDate::from_ymd_opt(2019, 11, 21)
                    .unwrap()
                    .and_hms_opt(9, 15, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_parse_nginx_listing() {
        let html = "<a href=\"tdb-1.4.3.tar.gz\">tdb-1.4.3.tar.gz</a>     23-Mar-2020 10:49    660311\n";
        let records = parse_listing("tdb", html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].version, "1.4.3");
        assert_eq!(
            records[0].date,
            Some(
                NaiveDate::from_ymd_opt(2020, 3, 23)
                    .unwrap()
                    .and_hms_opt(10, 49, 0)
                    .unwrap()
            )
        );
    }

    #[test]
    fn test_missing_date_is_none() {
        let html = r#"<a href="ldb-2.1.1.tar.gz">ldb-2.1.1.tar.gz</a>"#;
        let records = parse_listing("ldb", html);
        assert_eq!(records[0].date, None);
        assert_eq!(release_date(&records, "2.1.1"), None);
        assert_eq!(release_date(&records, "9.9.9"), None);
    }

    #[test]
    fn test_prefix_sharing_sibling_is_not_this_package() {
        let html = r#"<a href="samba-4.12.0rc1.tar.gz">x</a>
<a href="samba-4.12.3.tar.gz">x</a>
<a href="samba-tool-0.1.tar.gz">x</a>"#;
        let records = parse_listing("samba", html);
        let versions: Vec<&str> = records.iter().map(|r| r.version.as_str()).collect();
        assert_eq!(versions, vec!["4.12.0rc1", "4.12.3"]);
    }

    #[test]
    fn test_absolute_hrefs() {
        let html = r#"<a href="/pub/tevent/tevent-0.10.2.tar.gz">tevent-0.10.2.tar.gz</a>"#;
        let records = parse_listing("tevent", html);
        assert_eq!(records[0].version, "0.10.2");
    }

    #[test]
    fn test_package_name_is_escaped() {
        let html = r#"<a href="libfooXbar-1.0.0.tar.gz">x</a>"#;
        assert!(parse_listing("libfoo.bar", html).is_empty());
    }
}
