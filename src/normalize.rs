use serde::Deserialize;
use serde_json::Value;

// Known envelopes are tried in a fixed order; the first with a usable URL wins.
pub fn extract_urls(response: &Value) -> Vec<String> {
    match ResultShape::decode(response) {
        Some(shape) => shape.into_urls(),
        None => Vec::new(),
    }
}

pub fn extract_enhanced_prompt(response: &Value) -> Option<String> {
    ["prompt variations", "enhanced_prompt", "result"]
        .iter()
        .filter_map(|key| response.get(*key))
        .find_map(|value| match value {
            Value::String(s) => non_blank(s),
            Value::Array(items) => items.iter().filter_map(Value::as_str).find_map(non_blank),
            _ => None,
        })
        .map(|prompt| prompt.trim().to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultShape {
    // `{"result_url": "..."}`
    Single(String),
    // `{"result_urls": [...]}` or `{"urls": [...]}`
    List(Vec<String>),
    // `{"result": [{"urls": [...]}, "...", [...]]}`
    Nested(Vec<String>),
}

impl ResultShape {
    pub fn decode(response: &Value) -> Option<Self> {
        // serde would happily read a struct out of a JSON array
        if !response.is_object() {
            return None;
        }
        let decoders: [fn(&Value) -> Option<ResultShape>; 4] = [
            |v| {
                let single: SingleUrl = serde_json::from_value(v.clone()).ok()?;
                non_blank(&single.result_url).map(ResultShape::Single)
            },
            |v| {
                let list: ResultUrls = serde_json::from_value(v.clone()).ok()?;
                Some(ResultShape::List(collect_entries(&list.result_urls)))
            },
            |v| {
                let list: Urls = serde_json::from_value(v.clone()).ok()?;
                Some(ResultShape::List(collect_entries(&list.urls)))
            },
            |v| {
                let nested: NestedResult = serde_json::from_value(v.clone()).ok()?;
                let urls = nested
                    .result
                    .iter()
                    .flat_map(|item| match item {
                        ResultItem::WithUrls { urls } => collect_entries(urls),
                        ResultItem::Url(url) => non_blank(url).into_iter().collect(),
                        ResultItem::List(entries) => collect_entries(entries),
                        ResultItem::Other(_) => Vec::new(),
                    })
                    .collect();
                Some(ResultShape::Nested(urls))
            },
        ];

        decoders
            .iter()
            .filter_map(|decode| decode(response))
            .find(|shape| !shape.urls().is_empty())
    }

    pub fn urls(&self) -> &[String] {
        match self {
            ResultShape::Single(url) => std::slice::from_ref(url),
            ResultShape::List(urls) | ResultShape::Nested(urls) => urls,
        }
    }

    pub fn into_urls(self) -> Vec<String> {
        match self {
            ResultShape::Single(url) => vec![url],
            ResultShape::List(urls) | ResultShape::Nested(urls) => urls,
        }
    }
}

// --- Wire shapes ---

#[derive(Debug, Deserialize)]
struct SingleUrl {
    result_url: String,
}

#[derive(Debug, Deserialize)]
struct ResultUrls {
    result_urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct Urls {
    urls: Vec<UrlEntry>,
}

#[derive(Debug, Deserialize)]
struct NestedResult {
    result: Vec<ResultItem>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UrlEntry {
    Url(String),
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultItem {
    WithUrls { urls: Vec<UrlEntry> },
    Url(String),
    List(Vec<UrlEntry>),
    Other(Value),
}

fn collect_entries(entries: &[UrlEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            UrlEntry::Url(url) => non_blank(url),
            UrlEntry::Other(_) => None,
        })
        .collect()
}

fn non_blank(s: &str) -> Option<String> {
    (!s.trim().is_empty()).then(|| s.to_string())
}
