use lambda_runtime::{service_fn, LambdaEvent};
use log::{self, debug, info, warn};
use profile_service::*;
use serde_json::Value;
use std::sync::Arc;

type LambdaProfileService = ProfileService<EnvConfig, AwsSecretResolver, XrpcConnector>;

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    dotenvy::dotenv().ok();

    // hyper and the AWS SDK are very verbose, so crank those down even if everything else is
    // more verbose. CloudWatch timestamps every line already.
    let log_filter = "info,hyper=error,aws_config=warn,aws_smithy_runtime=warn";
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter))
        .format_timestamp(None)
        .init();

    info!("starting lambda");

    let secrets = AwsSecretResolver::from_env().await;
    // the blocking reqwest client spins up its own runtime; keep that off the async executor
    let connector = tokio::task::spawn_blocking(XrpcConnector::new).await??;
    let service = Arc::new(ProfileService::new(EnvConfig, secrets, connector));

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let service = service.clone();
        async move { handle(service, event).await }
    }))
    .await
}

async fn handle(
    service: Arc<LambdaProfileService>,
    event: LambdaEvent<Value>,
) -> Result<ProfileRecord, lambda_runtime::Error> {
    let (payload, context) = event.into_parts();
    debug!("invocation request_id={}", context.request_id);

    let result = tokio::task::spawn_blocking(move || service.handle_event(payload)).await?;
    result.map_err(|e| {
        warn!(
            "invocation failed request_id={} kind={}",
            context.request_id,
            e.kind()
        );
        e.into()
    })
}
