use ditto_api_models::WhoAmI;

use crate::client::{AppContext, CliResult};
use crate::output::{MessageLevel, emit, render_whoami};

pub(crate) async fn handle_whoami(ctx: &AppContext) -> CliResult<()> {
    let url = ctx.endpoint(&["api", "2", "whoami"])?;
    let identity: Option<WhoAmI> = ctx.fetch_optional(ctx.client.get(url)).await?;
    match identity {
        Some(identity) => render_whoami(&identity, ctx.output),
        None => {
            emit(MessageLevel::Error, "Failed to get user information");
            Ok(())
        }
    }
}
