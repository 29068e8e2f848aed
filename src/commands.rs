use chrono::{DateTime, Utc};
use clap::ArgMatches;
use dadddeck_api::output::{render_items, render_response};
use dadddeck_api::{
    ApiError, ApiResponse, CardFilters, CardListParams, CollectionParams, CreateKeyParams,
    DadDeckClient, PackParams, Paginator, RandomCardsParams, RetryPolicy,
};
use log::debug;
use serde_json::Value;

/// Per-invocation settings shared by every command.
pub struct Ctx<'a> {
    pub client: &'a DadDeckClient,
    pub policy: RetryPolicy,
    pub include_rate: bool,
}

fn opt_str(m: &ArgMatches, name: &str) -> Option<String> {
    m.get_one::<String>(name).cloned()
}

fn req_str<'m>(m: &'m ArgMatches, name: &str) -> &'m str {
    m.get_one::<String>(name).map(String::as_str).unwrap_or_default()
}

fn num(m: &ArgMatches, name: &str, default: u32) -> u32 {
    m.get_one::<u32>(name).copied().unwrap_or(default)
}

fn card_filters(m: &ArgMatches) -> CardFilters {
    CardFilters {
        rarity: opt_str(m, "rarity"),
        card_type: opt_str(m, "type"),
        series: m.get_one::<u32>("series").copied(),
        search: opt_str(m, "search"),
    }
}

fn many(m: &ArgMatches, name: &str) -> Vec<String> {
    m.get_many::<String>(name)
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default()
}

impl Ctx<'_> {
    async fn call<F, Fut>(&self, op: F) -> Result<Value, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<ApiResponse, ApiError>>,
    {
        let resp = self.policy.run(op).await?;
        Ok(render_response(&resp, self.include_rate))
    }
}

/// Dispatch a parsed command line to the matching endpoint.
pub async fn run(ctx: &Ctx<'_>, matches: &ArgMatches) -> Result<Value, ApiError> {
    let client = ctx.client;
    let Some((name, sub)) = matches.subcommand() else {
        return Err(ApiError::new("USAGE", "no command given; see --help"));
    };
    debug!("dispatching command {}", name);
    match (name, sub.subcommand()) {
        ("cards", Some(("list", m))) => {
            let params = CardListParams {
                page: num(m, "page", 1),
                page_size: num(m, "page-size", 50),
                filters: card_filters(m),
            };
            ctx.call(|| client.list_cards(&params)).await
        }
        ("cards", Some(("get", m))) => {
            let id = req_str(m, "id");
            ctx.call(|| client.get_card(id)).await
        }
        ("cards", Some(("random", m))) => {
            let params = RandomCardsParams {
                count: num(m, "count", 1),
                rarity: opt_str(m, "rarity"),
                card_type: opt_str(m, "type"),
                exclude: many(m, "exclude"),
            };
            ctx.call(|| client.random_cards(&params)).await
        }
        ("cards", Some(("all", m))) => {
            let filters = card_filters(m);
            let paginator = Paginator::default().with_max_pages(num(m, "max-pages", 1000));
            let policy = &ctx.policy;
            let items = paginator
                .collect_all(
                    |page, page_size, f: &CardFilters| {
                        let f = f.clone();
                        async move { policy.run(|| client.card_page(page, page_size, &f)).await }
                    },
                    &filters,
                )
                .await?;
            Ok(render_items(items))
        }
        ("packs", Some(("generate", m))) => {
            let params = PackParams {
                pack_type: opt_str(m, "pack-type").unwrap_or_else(|| "standard".into()),
                count: num(m, "count", 1),
                design: opt_str(m, "design"),
                series: m.get_one::<u32>("series").copied(),
            };
            ctx.call(|| client.generate_packs(&params)).await
        }
        ("collection", _) => {
            let user = req_str(sub, "user");
            let defaults = CollectionParams::default();
            let params = CollectionParams {
                rarity: opt_str(sub, "rarity"),
                sort_by: opt_str(sub, "sort-by").unwrap_or(defaults.sort_by),
                sort_order: opt_str(sub, "sort-order").unwrap_or(defaults.sort_order),
                page: num(sub, "page", 1),
                page_size: num(sub, "page-size", 50),
            };
            ctx.call(|| client.get_collection(user, &params)).await
        }
        ("leaderboard", _) => {
            let limit = num(sub, "limit", 100);
            let offset = num(sub, "offset", 0);
            ctx.call(|| client.get_leaderboard(limit, offset)).await
        }
        ("events", Some(("list", m))) => {
            let status = opt_str(m, "status");
            ctx.call(|| client.list_events(status.as_deref())).await
        }
        ("events", Some(("get", m))) => {
            let id = req_str(m, "id");
            ctx.call(|| client.get_event(id)).await
        }
        ("keys", Some(("list", _))) => ctx.call(|| client.list_keys()).await,
        ("keys", Some(("create", m))) => {
            let params = CreateKeyParams {
                name: req_str(m, "name").to_string(),
                tier: req_str(m, "tier").parse().unwrap_or_default(),
                expires_at: m.get_one::<DateTime<Utc>>("expires-at").copied(),
                allowed_origins: many(m, "allowed-origin"),
            };
            ctx.call(|| client.create_key(&params)).await
        }
        ("keys", Some(("revoke", m))) => {
            let id = req_str(m, "id");
            ctx.call(|| client.revoke_key(id)).await
        }
        (other, _) => Err(ApiError::new(
            "USAGE",
            format!("unknown command: {}", other),
        )),
    }
}
