use once_cell::sync::Lazy;
use regex::Regex;

// IP - user [timestamp] "METHOD path HTTP/x.y" status bytes "referer" "user-agent"
static COMBINED_LOG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"^(\S+) - (\S+) \[([^\]]+)\] "(\S+) ([^"]+) HTTP/\d\.\d" (\d+) (\d+) "([^"]*)" "([^"]*)""#,
    )
    .expect("combined log pattern is valid")
});

pub(crate) const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// The still-encoded fields of one line.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct RawRequest<'a> {
    pub ip: &'a str,
    pub timestamp: &'a str,
    pub method: &'a str,
    pub target: &'a str,
    pub status: &'a str,
    pub bytes: &'a str,
    pub referer: &'a str,
    pub user_agent: &'a str,
}

pub(crate) fn split_line(line: &str) -> Option<RawRequest<'_>> {
    let caps = COMBINED_LOG_LINE.captures(line)?;
    let field = |i: usize| caps.get(i).map(|m| m.as_str());

    Some(RawRequest {
        ip: field(1)?,
        timestamp: field(3)?,
        method: field(4)?,
        target: field(5)?,
        status: field(6)?,
        bytes: field(7)?,
        referer: field(8)?,
        user_agent: field(9)?,
    })
}
