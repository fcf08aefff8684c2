use ditto_api_models::{
    ApiResource, Normalized, NormalizedRecord, PatchOperation, Thing, diff, normalize,
};
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde_json::Value;

use crate::cli::{
    DeleteArgs, PayloadArgs, ThingDiffArgs, ThingGetArgs, ThingListArgs, ThingUpdateArgs,
};
use crate::client::{
    AppContext, CliError, CliResult, QueryParameters, confirm_deletion, read_json_object,
};
use crate::output::{MessageLevel, emit, print_json, render_thing_list};

pub(crate) const HEADER_HISTORICAL_REVISION: &str = "at-historical-revision";
const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Sub-trees compared by `thing diff`; identity and metadata fields are skipped.
const DIFFED_SECTIONS: [&str; 2] = ["attributes", "features"];

pub(crate) async fn handle_thing_create(ctx: &AppContext, args: PayloadArgs) -> CliResult<()> {
    let body = read_json_object(&args.file)?;
    let url = ctx.endpoint(&["api", "2", "things", &args.id])?;
    ctx.submit(ctx.client.put(url).json(&body)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully created thing '{}'", args.id),
    );
    Ok(())
}

pub(crate) async fn handle_thing_list(ctx: &AppContext, args: ThingListArgs) -> CliResult<()> {
    let mut url = ctx.endpoint(&["api", "2", "things"])?;
    QueryParameters::default()
        .with("fields", args.fields.as_deref())
        .with("ids", args.ids.as_deref())
        .with("timeout", args.timeout.as_deref())
        .apply_to(&mut url);

    let things: Vec<Thing> = ctx
        .fetch_optional(ctx.client.get(url))
        .await?
        .unwrap_or_default();
    render_thing_list(&things, ctx.output)
}

pub(crate) async fn handle_thing_get(ctx: &AppContext, args: ThingGetArgs) -> CliResult<()> {
    let thing = fetch_thing(ctx, &args.id, args.revision).await?;
    match normalize(thing.as_ref()) {
        Normalized::Found(record) => print_json(&record),
        Normalized::NotFound => {
            emit(MessageLevel::Error, &format!("Thing '{}' not found", args.id));
            Ok(())
        }
    }
}

pub(crate) async fn handle_thing_update(ctx: &AppContext, args: ThingUpdateArgs) -> CliResult<()> {
    let patch = read_json_object(&args.patch_file)?;
    let body = serde_json::to_vec(&patch)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to encode patch: {err}")))?;
    let url = ctx.endpoint(&["api", "2", "things", &args.id])?;
    ctx.submit(
        ctx.client
            .patch(url)
            .header(CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .body(body),
    )
    .await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully updated thing '{}'", args.id),
    );
    Ok(())
}

pub(crate) async fn handle_thing_diff(ctx: &AppContext, args: ThingDiffArgs) -> CliResult<()> {
    let Some(current) = fetch_thing(ctx, &args.id, None).await? else {
        emit(MessageLevel::Error, &format!("Thing '{}' not found", args.id));
        return Ok(());
    };
    let Some(historical) = fetch_thing(ctx, &args.id, Some(args.revision)).await? else {
        emit(
            MessageLevel::Error,
            &format!("Thing '{}' revision {} not found", args.id, args.revision),
        );
        return Ok(());
    };

    print_json(&DiffReport::between(&current, &historical, args.revision))
}

pub(crate) async fn handle_thing_delete(ctx: &AppContext, args: DeleteArgs) -> CliResult<()> {
    if !confirm_deletion(ctx, "thing", &args.id, args.confirm)? {
        return Ok(());
    }
    let url = ctx.endpoint(&["api", "2", "things", &args.id])?;
    ctx.submit(ctx.client.delete(url)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully deleted thing '{}'", args.id),
    );
    Ok(())
}

async fn fetch_thing(
    ctx: &AppContext,
    id: &str,
    revision: Option<u64>,
) -> CliResult<Option<Thing>> {
    let url = ctx.endpoint(&["api", "2", "things", id])?;
    let mut request = ctx.client.get(url);
    if let Some(revision) = revision {
        request = request.header(HEADER_HISTORICAL_REVISION, revision.to_string());
    }
    ctx.fetch_optional(request).await
}

/// Output of `thing diff`.
#[derive(Debug, Serialize)]
pub(crate) struct DiffReport {
    pub(crate) diff: Vec<PatchOperation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
}

impl DiffReport {
    /// Operations turning the historical revision into the current state.
    pub(crate) fn between(current: &Thing, historical: &Thing, revision: u64) -> Self {
        let operations = diff(
            &compared_sections(&historical.to_record()),
            &compared_sections(&current.to_record()),
        );
        let message = operations.is_empty().then(|| {
            format!("No differences found between current thing and revision {revision}")
        });
        Self {
            diff: operations,
            message,
        }
    }
}

fn compared_sections(record: &NormalizedRecord) -> Value {
    let sections = DIFFED_SECTIONS
        .iter()
        .filter_map(|section| {
            record
                .get(*section)
                .map(|value| ((*section).to_string(), value.clone()))
        })
        .collect();
    Value::Object(sections)
}
