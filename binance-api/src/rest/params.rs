use url::Url;

/// Ordered query string parameters of one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    params: Vec<(&'static str, String)>,
}

impl QueryParams {
    pub fn push(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.params.push((key, value.to_string()));
        return self;
    }

    /// Skips the parameter when `value` is `None`.
    pub fn push_opt(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        return self;
    }

    pub fn is_empty(&self) -> bool {
        return self.params.is_empty();
    }

    pub fn add_to_url(&self, url: &mut Url) {
        if self.params.is_empty() {
            return;
        }
        url.query_pairs_mut()
            .extend_pairs(self.params.iter().map(|(key, value)| (*key, value.as_str())));
    }
}
