use ditto_api_models::SearchResult;
use serde_json::json;

use crate::cli::{SearchCountArgs, SearchQueryArgs};
use crate::client::{AppContext, CliResult, QueryParameters};
use crate::output::{print_json, render_thing_list};

pub(crate) async fn handle_search_query(ctx: &AppContext, args: SearchQueryArgs) -> CliResult<()> {
    let mut url = ctx.endpoint(&["api", "2", "search", "things"])?;
    QueryParameters::default()
        .with("filter", args.filter.as_deref())
        .with("fields", args.fields.as_deref())
        .with("namespaces", args.namespaces.as_deref())
        .with("option", args.option.as_deref())
        .with("timeout", args.timeout.as_deref())
        .apply_to(&mut url);

    let result: SearchResult = ctx
        .fetch_optional(ctx.client.get(url))
        .await?
        .unwrap_or_default();
    if let Some(cursor) = &result.cursor {
        tracing::debug!(cursor = %cursor, "more search results available");
    }
    render_thing_list(&result.items, ctx.output)
}

pub(crate) async fn handle_search_count(ctx: &AppContext, args: SearchCountArgs) -> CliResult<()> {
    let mut url = ctx.endpoint(&["api", "2", "search", "things", "count"])?;
    QueryParameters::default()
        .with("filter", args.filter.as_deref())
        .with("namespaces", args.namespaces.as_deref())
        .apply_to(&mut url);

    let count: u64 = ctx
        .fetch_optional(ctx.client.get(url))
        .await?
        .unwrap_or_default();
    print_json(&json!({ "count": count }))
}
