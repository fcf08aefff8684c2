use ditto_api_models::{ExtensionData, Normalized, Resource, normalize};

use crate::cli::{DeleteArgs, IdArgs, PayloadArgs};
use crate::client::{AppContext, CliResult, confirm_deletion, read_json_object};
use crate::output::{MessageLevel, emit, has_content, print_json};

pub(crate) async fn handle_policy_create(ctx: &AppContext, args: PayloadArgs) -> CliResult<()> {
    let body = read_json_object(&args.file)?;
    let url = ctx.endpoint(&["api", "2", "policies", &args.id])?;
    let created = ctx.submit(ctx.client.put(url).json(&body)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully created policy '{}'", args.id),
    );
    match created {
        Some(policy) if has_content(&policy) => print_json(&policy),
        _ => Ok(()),
    }
}

pub(crate) async fn handle_policy_get(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&["api", "2", "policies", &args.id])?;
    let policy: Option<ExtensionData> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match normalize(policy.map(Resource::Document).as_ref()) {
        Normalized::Found(record) => print_json(&record),
        Normalized::NotFound => {
            emit(MessageLevel::Error, &format!("Policy '{}' not found", args.id));
            Ok(())
        }
    }
}

pub(crate) async fn handle_policy_entries(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let url = ctx.endpoint(&["api", "2", "policies", &args.id, "entries"])?;
    let entries: Option<ExtensionData> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match normalize(entries.map(Resource::Document).as_ref()).into_record() {
        Some(record) if !record.is_empty() => print_json(&record),
        _ => {
            emit(MessageLevel::Warning, "No policy entries found");
            Ok(())
        }
    }
}

pub(crate) async fn handle_policy_delete(ctx: &AppContext, args: DeleteArgs) -> CliResult<()> {
    if !confirm_deletion(ctx, "policy", &args.id, args.confirm)? {
        return Ok(());
    }
    let url = ctx.endpoint(&["api", "2", "policies", &args.id])?;
    ctx.submit(ctx.client.delete(url)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully deleted policy '{}'", args.id),
    );
    Ok(())
}
