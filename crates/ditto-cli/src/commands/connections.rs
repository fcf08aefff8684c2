use ditto_api_models::{Connection, Normalized, normalize};

use crate::cli::{ConnectionGetArgs, ConnectionListArgs, DeleteArgs, PayloadArgs};
use crate::client::{
    AppContext, CliResult, QueryParameters, confirm_deletion, read_json_object,
};
use crate::output::{MessageLevel, emit, print_json, render_connection_list};

pub(crate) async fn handle_connection_create(
    ctx: &AppContext,
    args: PayloadArgs,
) -> CliResult<()> {
    let body = read_json_object(&args.file)?;
    let url = ctx.endpoint(&["api", "2", "connections", &args.id])?;
    ctx.submit(ctx.client.put(url).json(&body)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully created connection '{}'", args.id),
    );
    Ok(())
}

pub(crate) async fn handle_connection_list(
    ctx: &AppContext,
    args: ConnectionListArgs,
) -> CliResult<()> {
    let mut url = ctx.endpoint(&["api", "2", "connections"])?;
    QueryParameters::default()
        .with("fields", args.fields.as_deref())
        .apply_to(&mut url);

    let connections: Vec<Connection> = ctx
        .fetch_optional(ctx.client.get(url))
        .await?
        .unwrap_or_default();
    render_connection_list(&connections, ctx.output)
}

pub(crate) async fn handle_connection_get(
    ctx: &AppContext,
    args: ConnectionGetArgs,
) -> CliResult<()> {
    let mut url = ctx.endpoint(&["api", "2", "connections", &args.id])?;
    QueryParameters::default()
        .with("fields", args.fields.as_deref())
        .apply_to(&mut url);

    let connection: Option<Connection> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match normalize(connection.as_ref()) {
        Normalized::Found(record) => print_json(&record),
        Normalized::NotFound => {
            emit(
                MessageLevel::Error,
                &format!("Connection '{}' not found", args.id),
            );
            Ok(())
        }
    }
}

pub(crate) async fn handle_connection_delete(
    ctx: &AppContext,
    args: DeleteArgs,
) -> CliResult<()> {
    if !confirm_deletion(ctx, "connection", &args.id, args.confirm)? {
        return Ok(());
    }
    let url = ctx.endpoint(&["api", "2", "connections", &args.id])?;
    ctx.submit(ctx.client.delete(url)).await?;
    emit(
        MessageLevel::Success,
        &format!("Successfully deleted connection '{}'", args.id),
    );
    Ok(())
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
    async fn list_renders_table_rows() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/2/connections");
            then.status(200).json_body(json!([
                {
                    "id": "mqtt-bridge",
                    "connectionStatus": "open",
                    "connectionType": "mqtt",
                    "uri": "tcp://broker:1883",
                    "sources": []
                }
            ]));
        });

        let ctx = context_for(&server, OutputFormat::Table, true);
        handle_connection_list(&ctx, ConnectionListArgs::default())
            .await
            .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn get_forwards_field_selection() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/2/connections/mqtt-bridge")
                .query_param("fields", "id,connectionStatus");
            then.status(200)
                .json_body(json!({"id": "mqtt-bridge", "connectionStatus": "closed"}));
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_connection_get(
            &ctx,
            ConnectionGetArgs {
                id: "mqtt-bridge".into(),
                fields: Some("id,connectionStatus".into()),
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn create_puts_connection_definition() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let file = dir.path().join("connection.json");
        fs::write(
            &file,
            r#"{"connectionType": "mqtt", "connectionStatus": "open", "uri": "tcp://broker:1883"}"#,
        )?;

        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/2/connections/mqtt-bridge")
                .json_body(json!({
                    "connectionType": "mqtt",
                    "connectionStatus": "open",
                    "uri": "tcp://broker:1883"
                }));
            then.status(201);
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        handle_connection_create(
            &ctx,
            PayloadArgs {
                id: "mqtt-bridge".into(),
                file,
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert();
        Ok(())
    }

    #[tokio::test]
    async fn declined_delete_makes_no_request() -> Result<()> {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(DELETE).path("/api/2/connections/mqtt-bridge");
            then.status(204);
        });

        let ctx = context_for(&server, OutputFormat::Json, false);
        handle_connection_delete(
            &ctx,
            DeleteArgs {
                id: "mqtt-bridge".into(),
                confirm: false,
            },
        )
        .await
        .map_err(|err| anyhow!(err.display_message()))?;
        mock.assert_calls(0);
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_propagate_as_failures() -> Result<()> {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(DELETE).path("/api/2/connections/mqtt-bridge");
            then.status(500).body("internal error");
        });

        let ctx = context_for(&server, OutputFormat::Json, true);
        let err = handle_connection_delete(
            &ctx,
            DeleteArgs {
                id: "mqtt-bridge".into(),
                confirm: true,
            },
        )
        .await
        .expect_err("500 must fail");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().contains("internal error"));
        Ok(())
    }
}
