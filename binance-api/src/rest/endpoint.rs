use std::borrow::Cow;

use http::Method;

use super::params::QueryParams;

/// A REST resource: where it lives and what it is asked with.
pub trait Endpoint {
    fn method(&self) -> Method {
        return Method::GET;
    }

    /// Path relative to the base URL, without a leading slash.
    fn endpoint(&self) -> Cow<'static, str>;

    fn params(&self) -> QueryParams {
        return QueryParams::default();
    }
}
