//! Parses the `text://<path>?lines=S-E` resource URI into a `read_range` call.
//! `E` may be omitted (`S-` or bare `S`) meaning "to end of file".

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResourceUri {
    pub path: String,
    pub line_start: usize,
    pub line_end: Option<usize>,
}

const SCHEME: &str = "text://";

pub fn parse(uri: &str) -> Option<ParsedResourceUri> {
    let rest = uri.strip_prefix(SCHEME)?;
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    if path.is_empty() {
        return None;
    }

    let lines_value = query.and_then(|query| {
        query
            .split('&')
            .find_map(|pair| pair.strip_prefix("lines="))
    });

    let (line_start, line_end) = match lines_value {
        Some(spec) => parse_lines_spec(spec)?,
        None => (1, None),
    };

    Some(ParsedResourceUri {
        path: path.to_string(),
        line_start,
        line_end,
    })
}

fn parse_lines_spec(spec: &str) -> Option<(usize, Option<usize>)> {
    match spec.split_once('-') {
        Some((start, "")) => Some((start.parse().ok()?, None)),
        Some((start, end)) => Some((start.parse().ok()?, Some(end.parse().ok()?))),
        None => Some((spec.parse().ok()?, Some(spec.parse().ok()?))),
    }
}
