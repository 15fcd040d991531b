use anyhow::Result;
use log::{self, debug};
use profile_service::*;
use std::io::Write;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(
    rename_all = "kebab-case",
    about = "Look up an AT protocol profile, authenticated as the utility account"
)]
struct Opt {
    /// Base URL of the PDS or AppView to query
    #[structopt(long = "--host", env = "ATPROTO_BASE_URL")]
    atproto_base_url: String,

    /// Name of the secret holding util account credentials JSON
    ///
    /// By default this is read as an environment variable name; see --aws.
    #[structopt(long = "--secret-name", env = "PDS_UTIL_ACCOUNT_CREDS")]
    secret_name: String,

    /// Fetch the secret from AWS Secrets Manager
    #[structopt(long)]
    aws: bool,

    /// Log more messages. Pass multiple times for ever more verbosity
    ///
    /// By default, it'll only report errors. Passing `-v` one time also prints
    /// warnings, `-vv` enables info logging, `-vvv` debug, and `-vvvv` trace.
    #[structopt(long, short = "v", parse(from_occurrences))]
    verbose: i8,

    /// DID (or handle) to look up
    did: String,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let opt = Opt::from_args();

    let log_level = match opt.verbose {
        std::i8::MIN..=-1 => "none",
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        4..=std::i8::MAX => "trace",
    };
    // hyper logging is very verbose, so crank that down even if everything else is more verbose
    let log_filter = format!("{},hyper=error", log_level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter))
        .format_timestamp(None)
        .init();

    debug!("Args parsed, starting up");

    if let Err(err) = run(opt) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn run(opt: Opt) -> Result<()> {
    let config = Config {
        atproto_base_url: opt.atproto_base_url.trim_end_matches('/').to_string(),
        util_account_secret_name: opt.secret_name,
    };
    let connector = XrpcConnector::new()?;
    if opt.aws {
        let rt = tokio::runtime::Runtime::new()?;
        let secrets = rt.block_on(AwsSecretResolver::from_env());
        lookup(ProfileService::new(config, secrets, connector), &opt.did)
    } else {
        lookup(
            ProfileService::new(config, EnvSecretResolver, connector),
            &opt.did,
        )
    }
}

fn lookup<S: SecretResolver>(
    service: ProfileService<Config, S, XrpcConnector>,
    did: &str,
) -> Result<()> {
    let profile = service.get_profile_for_did(did)?;
    writeln!(
        &mut std::io::stdout(),
        "{}",
        serde_json::to_string_pretty(&profile)?
    )?;
    Ok(())
}
