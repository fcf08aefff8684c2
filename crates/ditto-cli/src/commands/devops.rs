//! Service configuration and runtime log levels.
//!
//! These routes live under `/devops` rather than `/api/2` and require the
//! administrative user.

use ditto_api_models::{ExtensionData, Resource, normalize};
use serde_json::Value;

use crate::cli::{LoggingGetArgs, LoggingUpdateArgs};
use crate::client::{AppContext, CliResult, read_json_object};
use crate::output::{MessageLevel, emit, has_content, print_json};

pub(crate) async fn handle_config_get(ctx: &AppContext) -> CliResult<()> {
    let url = ctx.endpoint(&["devops", "config"])?;
    let config: Option<ExtensionData> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match normalize(config.map(Resource::Document).as_ref()).into_record() {
        Some(record) if !record.is_empty() => print_json(&record),
        _ => {
            emit(MessageLevel::Warning, "No configuration found");
            Ok(())
        }
    }
}

pub(crate) async fn handle_logging_get(ctx: &AppContext, args: LoggingGetArgs) -> CliResult<()> {
    let url = ctx.endpoint(&logging_route(args.module_name.as_deref()))?;
    let config: Option<Value> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match config {
        Some(config) if has_content(&config) => print_json(&config),
        _ => {
            emit(MessageLevel::Warning, "No logging configuration found");
            Ok(())
        }
    }
}

pub(crate) async fn handle_logging_update(
    ctx: &AppContext,
    args: LoggingUpdateArgs,
) -> CliResult<()> {
    let update = read_json_object(&args.update_file)?;
    let url = ctx.endpoint(&logging_route(args.module_name.as_deref()))?;
    match ctx.submit(ctx.client.put(url).json(&update)).await? {
        Some(results) if has_content(&results) => print_json(&results),
        _ => {
            emit(MessageLevel::Warning, "No logging update results returned");
            Ok(())
        }
    }
}

/// `/devops/logging` for every service, `/devops/logging/{module}` for one.
fn logging_route(module_name: Option<&str>) -> Vec<&str> {
    let mut segments = vec!["devops", "logging"];
    if let Some(module) = module_name.filter(|module| !module.is_empty()) {
        segments.push(module);
    }
    segments
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

    #[test]
    fn logging_route_appends_module_when_given() {
        assert_eq!(logging_route(None), vec!["devops", "logging"]);
        assert_eq!(logging_route(Some("")), vec!["devops", "logging"]);
        assert_eq!(
            logging_route(Some("gateway")),
            vec!["devops", "logging", "gateway"]
        );
    }

    #[tokio::test]
    async fn config_get_reads_devops_route() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/devops/config");
            then.status(200)
                .json_body(json!({"gateway": {"ditto": {"http": {"port": 8080}}}}));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_config_get(&ctx)
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn module_logging_get_targets_module_route() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/devops/logging/gateway");
            then.status(200)
                .json_body(json!([{"logger": "ROOT", "level": "info"}]));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_logging_get(
            &ctx,
            LoggingGetArgs {
                module_name: Some("gateway".into()),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn logging_update_puts_levels() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("levels.json");
        fs::write(&file, r#"{"logger": "org.eclipse.ditto", "level": "debug"}"#)?;

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/devops/logging")
                .json_body(json!({"logger": "org.eclipse.ditto", "level": "debug"}));
            then.status(200).json_body(json!([
                {"serviceName": "things", "status": 200, "success": true}
            ]));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_logging_update(
            &ctx,
            LoggingUpdateArgs {
                update_file: file,
                module_name: None,
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }
}
