use url::Url;

use crate::error::{Result, UpstreamError};

/// Builds versioned upstream URLs from a configured base endpoint
///
/// Every URL carries exactly one `api-version` query parameter. Path segments
/// are percent-encoded individually, so an identifier supplied by a client
/// can never introduce extra path components.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base: Url,
    api_version: String,
}

impl UrlBuilder {
    /// `setting` names the configuration entry the base came from; it is used
    /// in the error when the base is missing or malformed.
    pub fn new(base: Option<&str>, setting: &str, api_version: impl Into<String>) -> Result<Self> {
        let raw = base
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| UpstreamError::NotConfigured(setting.to_string()))?;

        let base = Url::parse(raw.trim_end_matches('/')).map_err(|e| {
            UpstreamError::InvalidConfig(format!("{} is not a valid URL: {}", setting, e))
        })?;

        if base.cannot_be_a_base() {
            return Err(UpstreamError::InvalidConfig(format!(
                "{} is not a valid base URL",
                setting
            )));
        }

        Ok(Self {
            base,
            api_version: api_version.into(),
        })
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Resolve a relative path such as `/threads/t1/runs`
    ///
    /// Empty segments are dropped, so `//threads//t1` and `threads/t1/`
    /// resolve to the same URL.
    pub fn path(&self, path: &str) -> Url {
        self.segments(path.split('/'))
    }

    /// Resolve a path given as individual (unencoded) segments
    pub fn segments<I, S>(&self, segments: I) -> Url
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base.clone();

        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            for segment in segments {
                let segment = segment.as_ref();
                if !segment.is_empty() {
                    path.push(segment);
                }
            }
        }

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "api-version")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        url.set_query(None);
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in &retained {
                query.append_pair(k, v);
            }
            query.append_pair("api-version", &self.api_version);
        }

        url
    }
}

/// One-shot form of [`UrlBuilder`]
pub fn versioned_url(base: Option<&str>, setting: &str, path: &str, api_version: &str) -> Result<Url> {
    Ok(UrlBuilder::new(base, setting, api_version)?.path(path))
}
