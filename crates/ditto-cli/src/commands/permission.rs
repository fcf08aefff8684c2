use ditto_api_models::{Resource, normalize};
use serde_json::Value;

use crate::cli::PermissionCheckArgs;
use crate::client::{AppContext, CliResult, read_json_object};
use crate::output::{MessageLevel, emit, print_json};

pub(crate) async fn handle_permission_check(
    ctx: &AppContext,
    args: PermissionCheckArgs,
) -> CliResult<()> {
    let request = read_json_object(&args.request_file)?;
    let url = ctx.endpoint(&["api", "2", "checkPermissions"])?;
    let results = match ctx.submit(ctx.client.post(url).json(&request)).await? {
        None => {
            emit(MessageLevel::Error, "Permission check failed");
            return Ok(());
        }
        Some(Value::Object(results)) => Some(Resource::Document(results)),
        Some(_) => None,
    };
    match normalize(results.as_ref()).into_record() {
        Some(record) if !record.is_empty() => print_json(&record),
        _ => {
            emit(MessageLevel::Warning, "No permission check results returned");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::context_for;
    use crate::output::OutputFormat;
    use anyhow::{Result, anyhow};
    use httpmock::prelude::*;
    use serde_json::json;
    use std::fs;

    #[tokio::test]
    async fn check_posts_request_document() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("check.json");
        let request = json!({
            "lamp_read": {
                "resource": "thing:/features/power",
                "entityId": "org.example:lamp",
                "hasPermissions": ["READ"]
            }
        });
        fs::write(&file, serde_json::to_string(&request)?)?;

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/2/checkPermissions")
                .json_body(request.clone());
            then.status(200).json_body(json!({"lamp_read": true}));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_permission_check(&ctx, PermissionCheckArgs { request_file: file })
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn empty_results_are_a_warning() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("check.json");
        fs::write(&file, "{}")?;

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/2/checkPermissions");
            then.status(200).json_body(json!({}));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        let outcome = handle_permission_check(&ctx, PermissionCheckArgs { request_file: file }).await;
        assert!(outcome.is_ok());
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn non_object_results_are_a_warning() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("check.json");
        fs::write(&file, r#"{"lamp_read": {"resource": "thing:/"}}"#)?;

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(POST).path("/api/2/checkPermissions");
            then.status(200).json_body(json!([true]));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        let outcome = handle_permission_check(&ctx, PermissionCheckArgs { request_file: file }).await;
        assert!(outcome.is_ok());
        mock.assert_calls(1);
        Ok(())
    }
}
