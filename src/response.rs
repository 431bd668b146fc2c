use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    /// Meta for an unpaginated listing: only the total is known.
    pub fn total_only(total: usize) -> Self {
        Self {
            page: None,
            per_page: None,
            total: i64::try_from(total).ok(),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

impl<U: Serialize> ApiResponse<Vec<U>> {
    /// Wrap an unpaginated listing, recording its length in `meta.total`.
    pub fn list(message: impl Into<String>, items: Vec<U>) -> Self {
        let meta = Meta::total_only(items.len());
        Self {
            message: message.into(),
            data: Some(items),
            meta: Some(meta),
        }
    }
}
