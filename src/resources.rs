//! Endpoint wrappers. Each maps its parameters onto a query string or JSON
//! body and hands off to [`DadDeckClient::request`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::client::DadDeckClient;
use crate::error::ApiError;
use crate::http::{encode_path_segment, Query};
use crate::pagination::{Page, Paginator};
use crate::types::{ApiResponse, ApiTier};

pub const LEADERBOARD_MAX_LIMIT: u32 = 1000;

/// Filters shared by card listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFilters {
    pub rarity: Option<String>,
    pub card_type: Option<String>,
    pub series: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardListParams {
    pub page: u32,
    pub page_size: u32,
    pub filters: CardFilters,
}

impl Default for CardListParams {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
            filters: CardFilters::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RandomCardsParams {
    pub count: u32,
    pub rarity: Option<String>,
    pub card_type: Option<String>,
    pub exclude: Vec<String>,
}

impl Default for RandomCardsParams {
    fn default() -> Self {
        Self {
            count: 1,
            rarity: None,
            card_type: None,
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackParams {
    pub pack_type: String,
    pub count: u32,
    pub design: Option<String>,
    pub series: Option<u32>,
}

impl Default for PackParams {
    fn default() -> Self {
        Self {
            pack_type: "standard".into(),
            count: 1,
            design: None,
            series: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionParams {
    pub rarity: Option<String>,
    pub sort_by: String,
    pub sort_order: String,
    pub page: u32,
    pub page_size: u32,
}

impl Default for CollectionParams {
    fn default() -> Self {
        Self {
            rarity: None,
            sort_by: "rarity".into(),
            sort_order: "desc".into(),
            page: 1,
            page_size: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateKeyParams {
    pub name: String,
    pub tier: ApiTier,
    pub expires_at: Option<DateTime<Utc>>,
    pub allowed_origins: Vec<String>,
}

impl CardFilters {
    fn apply(&self, query: Query) -> Query {
        query
            .set_opt("rarity", self.rarity.as_deref())
            .set_opt("type", self.card_type.as_deref())
            .set_opt("series", self.series)
            .set_opt("search", self.search.as_deref())
    }
}

impl CreateKeyParams {
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".into(), json!(self.name));
        body.insert("tier".into(), json!(self.tier.as_str()));
        if let Some(at) = self.expires_at {
            body.insert(
                "expiresAt".into(),
                json!(at.to_rfc3339_opts(SecondsFormat::Secs, true)),
            );
        }
        if !self.allowed_origins.is_empty() {
            body.insert("allowedOrigins".into(), json!(self.allowed_origins));
        }
        Value::Object(body)
    }
}

impl PackParams {
    fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("packType".into(), json!(self.pack_type));
        body.insert("count".into(), json!(self.count));
        if let Some(design) = self.design.as_deref().filter(|d| !d.is_empty()) {
            body.insert("design".into(), json!(design));
        }
        if let Some(series) = self.series {
            body.insert("series".into(), json!(series));
        }
        Value::Object(body)
    }
}

impl DadDeckClient {
    pub async fn list_cards(&self, params: &CardListParams) -> Result<ApiResponse, ApiError> {
        let query = Query::new()
            .set("page", params.page)
            .set("pageSize", params.page_size);
        let query = params.filters.apply(query);
        self.get("/cards", &query).await
    }

    pub async fn get_card(&self, card_id: &str) -> Result<ApiResponse, ApiError> {
        let path = format!("/cards/{}", encode_path_segment(card_id));
        self.get(&path, &Query::new()).await
    }

    pub async fn random_cards(&self, params: &RandomCardsParams) -> Result<ApiResponse, ApiError> {
        let query = Query::new()
            .set("count", params.count)
            .set_opt("rarity", params.rarity.as_deref())
            .set_opt("type", params.card_type.as_deref());
        let body = (!params.exclude.is_empty()).then(|| json!({ "exclude": params.exclude }));
        self.post("/cards/random", &query, body.as_ref()).await
    }

    pub async fn generate_packs(&self, params: &PackParams) -> Result<ApiResponse, ApiError> {
        let body = params.to_body();
        self.post("/packs/generate", &Query::new(), Some(&body)).await
    }

    pub async fn get_collection(
        &self,
        user_id: &str,
        params: &CollectionParams,
    ) -> Result<ApiResponse, ApiError> {
        let query = Query::new()
            .set("sortBy", &params.sort_by)
            .set("sortOrder", &params.sort_order)
            .set("page", params.page)
            .set("pageSize", params.page_size)
            .set_opt("rarity", params.rarity.as_deref());
        let path = format!("/collections/{}", encode_path_segment(user_id));
        self.get(&path, &query).await
    }

    /// `limit` is clamped to [`LEADERBOARD_MAX_LIMIT`].
    pub async fn get_leaderboard(&self, limit: u32, offset: u32) -> Result<ApiResponse, ApiError> {
        let query = Query::new()
            .set("limit", limit.min(LEADERBOARD_MAX_LIMIT))
            .set("offset", offset);
        self.get("/leaderboard", &query).await
    }

    pub async fn list_events(&self, status: Option<&str>) -> Result<ApiResponse, ApiError> {
        self.get("/events", &Query::new().set_opt("status", status)).await
    }

    pub async fn get_event(&self, event_id: &str) -> Result<ApiResponse, ApiError> {
        let path = format!("/events/{}", encode_path_segment(event_id));
        self.get(&path, &Query::new()).await
    }

    pub async fn list_keys(&self) -> Result<ApiResponse, ApiError> {
        self.get("/auth/keys", &Query::new()).await
    }

    /// The response carries the full secret; it is not retrievable later.
    pub async fn create_key(&self, params: &CreateKeyParams) -> Result<ApiResponse, ApiError> {
        let body = params.to_body();
        self.post("/auth/keys", &Query::new(), Some(&body)).await
    }

    pub async fn revoke_key(&self, key_id: &str) -> Result<ApiResponse, ApiError> {
        self.delete(&format!("/auth/keys/{}", encode_path_segment(key_id)))
            .await
    }

    /// Fetch one page of cards as items plus the `hasNext` flag.
    pub async fn card_page(
        &self,
        page: u32,
        page_size: u32,
        filters: &CardFilters,
    ) -> Result<Page<Value>, ApiError> {
        let params = CardListParams {
            page,
            page_size,
            filters: filters.clone(),
        };
        let resp = self.list_cards(&params).await?;
        Page::from_listing(resp.data.as_ref(), "cards")
    }

    /// Every card matching `filters`, walking pages of [`crate::pagination::MAX_PAGE_SIZE`].
    pub async fn get_all_cards(
        &self,
        filters: &CardFilters,
        paginator: Paginator,
    ) -> Result<Vec<Value>, ApiError> {
        paginator
            .collect_all(
                |page, page_size, f: &CardFilters| {
                    let f = f.clone();
                    async move { self.card_page(page, page_size, &f).await }
                },
                filters,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn filters_skip_unset_fields() {
        let f = CardFilters {
            rarity: Some("rare".into()),
            search: Some(String::new()),
            ..Default::default()
        };
        let q = f.apply(Query::new());
        assert_eq!(q.get("rarity"), Some("rare"));
        assert_eq!(q.get("search"), None);
        assert_eq!(q.get("type"), None);
        assert_eq!(q.pairs().len(), 1);
    }

    #[test]
    fn pack_body_defaults() {
        assert_eq!(
            PackParams::default().to_body(),
            json!({"packType": "standard", "count": 1})
        );
        let p = PackParams {
            pack_type: "premium".into(),
            count: 3,
            design: Some("grill".into()),
            series: Some(2),
        };
        assert_eq!(
            p.to_body(),
            json!({"packType": "premium", "count": 3, "design": "grill", "series": 2})
        );
    }

    #[test]
    fn create_key_body() {
        let p = CreateKeyParams {
            name: "My Project".into(),
            ..Default::default()
        };
        assert_eq!(p.to_body(), json!({"name": "My Project", "tier": "free"}));

        let p = CreateKeyParams {
            name: "ci".into(),
            tier: ApiTier::Basic,
            expires_at: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            allowed_origins: vec!["https://example.com".into()],
        };
        assert_eq!(
            p.to_body(),
            json!({
                "name": "ci",
                "tier": "basic",
                "expiresAt": "2026-01-01T00:00:00Z",
                "allowedOrigins": ["https://example.com"]
            })
        );
    }
}
