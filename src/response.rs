use axum::Json;
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    pub data: Option<T>,
    #[serde(rename = "_metadata", skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetaData>,
}

pub fn success<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        message: message.into(),
        data: Some(data),
        metadata: None,
    })
}

pub fn paged<T: Serialize>(data: T, metadata: MetaData) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        status: "success",
        message: "Successful".into(),
        data: Some(data),
        metadata: Some(metadata),
    })
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

pub const MAX_LIMIT: i64 = 100;
/// Keeps `page * limit` and `(page + 1) * limit` well inside `i64`.
pub const MAX_PAGE: i64 = 1 << 31;

impl Pagination {
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.clamp(0, MAX_PAGE),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        self.page * self.limit
    }
}

#[derive(Debug, Serialize)]
pub struct MetaData {
    pub page: i64,
    pub per_page: i64,
    pub page_count: i64,
    pub total_count: i64,
    pub links: Vec<Link>,
}

/// Serialized as a single-key map, e.g. `{"next": "/api/v1/reviews?page=1&limit=10"}`.
#[derive(Debug, PartialEq, Eq)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
}

impl Serialize for Link {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.rel, &self.href)?;
        map.end()
    }
}

impl MetaData {
    /// `path` is the request path; `filters` are repeated in every link
    /// ahead of `page` and `limit`, form-encoded.
    pub fn build(
        path: &str,
        filters: &[(&str, &str)],
        p: &Pagination,
        total_count: i64,
        page_count: i64,
    ) -> Self {
        let href = |page: i64| {
            let query = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(filters.iter().copied())
                .append_pair("page", &page.to_string())
                .append_pair("limit", &p.limit.to_string())
                .finish();
            format!("{path}?{query}")
        };

        let mut links = Vec::new();
        if p.page > 0 {
            links.push(Link { rel: "prev", href: href(p.page - 1) });
        }
        links.push(Link { rel: "self", href: href(p.page) });
        if (p.page + 1) * p.limit < total_count {
            links.push(Link { rel: "next", href: href(p.page + 1) });
        }

        Self {
            page: p.page,
            per_page: p.limit,
            page_count,
            total_count,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let p = Pagination { page: 1, limit: 10 };
        let meta = MetaData::build("/api/v1/reviews", &[("title", "alien")], &p, 35, 10);
        let rels: Vec<_> = meta.links.iter().map(|l| l.rel).collect();
        assert_eq!(rels, vec!["prev", "self", "next"]);
        assert_eq!(meta.links[2].href, "/api/v1/reviews?title=alien&page=2&limit=10");
    }

    #[test]
    fn last_page_has_no_next() {
        let p = Pagination { page: 0, limit: 10 };
        let meta = MetaData::build("/api/v1/reviews", &[], &p, 4, 4);
        assert_eq!(meta.links, vec![Link { rel: "self", href: "/api/v1/reviews?page=0&limit=10".into() }]);
    }

    #[test]
    fn filter_values_are_form_encoded() {
        let p = Pagination { page: 0, limit: 10 };
        let meta = MetaData::build("/api/v1/reviews", &[("title", "R&B #1 100%")], &p, 1, 1);
        assert_eq!(
            meta.links[0].href,
            "/api/v1/reviews?title=R%26B+%231+100%25&page=0&limit=10"
        );
    }

    #[test]
    fn links_serialize_as_single_key_maps() {
        let p = Pagination { page: 1, limit: 10 };
        let meta = MetaData::build("/api/v1/movies", &[], &p, 30, 10);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["links"][0], serde_json::json!({"prev": "/api/v1/movies?page=0&limit=10"}));
        assert_eq!(json["links"][2]["next"], "/api/v1/movies?page=2&limit=10");
    }

    #[test]
    fn clamp_rejects_negative_page_and_zero_limit() {
        let p = Pagination { page: -3, limit: 0 }.clamped();
        assert_eq!((p.page, p.limit), (0, 1));
    }

    #[test]
    fn huge_page_is_bounded_before_offset_math() {
        let p = Pagination { page: i64::MAX, limit: i64::MAX }.clamped();
        assert_eq!((p.page, p.limit), (MAX_PAGE, MAX_LIMIT));
        assert_eq!(p.offset(), MAX_PAGE * MAX_LIMIT);
        let meta = MetaData::build("/api/v1/reviews", &[], &p, 0, 0);
        assert_eq!(meta.links.len(), 2);
    }
}
