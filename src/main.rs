use anyhow::{Context, Result};
use clap::Parser;
use gs2_client::credential::mask;
use gs2_client::http::Response;
use gs2_client::runtime::RealRuntime;
use gs2_client::{ClientConfig, Credential, Gs2Client, Method, Operation, Region};

/// gs2 - GS2 API client
///
/// Sends signed or token-authenticated calls to GS2 services.
///
/// Credentials are read from GS2_CLIENT_ID and GS2_CLIENT_SECRET when the
/// flags are not given. GS2_MAX_ATTEMPTS, GS2_RETRY_DELAY_MS and
/// GS2_TIMEOUT_SECS tune retries and timeouts.
///
/// Examples:
///   gs2 login
///   gs2 call GET inbox DescribeMessages --path /user/me/message
///   gs2 call POST inbox SendMessage --path /message --body '{"body":"hi"}'
#[derive(Parser, Debug)]
#[command(name = "gs2", author, version = env!("GS2_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Client id of the API credential
    #[arg(long, env = "GS2_CLIENT_ID", value_name = "ID", global = true)]
    pub client_id: Option<String>,

    /// Client secret of the API credential
    #[arg(
        long,
        env = "GS2_CLIENT_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        global = true
    )]
    pub client_secret: Option<String>,

    /// Region to send calls to
    #[arg(
        long,
        short = 'r',
        env = "GS2_REGION",
        default_value = "ap-northeast-1",
        global = true
    )]
    pub region: Region,

    /// Endpoint template with {service} and {region} placeholders
    #[arg(long, env = "GS2_ENDPOINT", value_name = "TEMPLATE", global = true)]
    pub endpoint: Option<String>,

    /// Authentication scheme
    #[arg(long, value_enum, default_value_t = Scheme::Signed, global = true)]
    pub scheme: Scheme,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    /// Sign every request with the client secret
    Signed,
    /// Log in once and send the project token
    Token,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Log in and print the (masked) project token
    Login,

    /// Call a service function and print the JSON response
    Call(CallArgs),
}

#[derive(clap::Args, Debug)]
pub struct CallArgs {
    /// HTTP method: GET, POST, PUT or DELETE
    #[arg(value_name = "METHOD")]
    pub method: Method,

    /// Target service, e.g. "inbox"
    #[arg(value_name = "SERVICE")]
    pub service: String,

    /// Function name, e.g. "DescribeMessages"
    #[arg(value_name = "FUNCTION")]
    pub function: String,

    /// Module used for signing when it differs from the service
    #[arg(long, value_name = "MODULE")]
    pub module: Option<String>,

    /// Path appended to the endpoint
    #[arg(long, value_name = "PATH", default_value = "/")]
    pub path: String,

    /// JSON request body (POST and PUT only)
    #[arg(long, value_name = "JSON")]
    pub body: Option<String>,
}

impl Cli {
    fn credential(&self) -> Credential {
        Credential::from_parts(self.client_id.clone(), self.client_secret.clone())
    }

    fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env(&RealRuntime)?;
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.as_str());
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Login => login(&cli).await?,
        Commands::Call(args) => call(&cli, args).await?,
    }
    Ok(())
}

async fn login(cli: &Cli) -> Result<()> {
    let client = Gs2Client::login(cli.credential(), cli.region, cli.config()?)
        .await
        .context("Login failed")?;
    let token = client.credential().project_token().unwrap_or_default();
    println!("{}", mask(token));
    Ok(())
}

async fn call(cli: &Cli, args: &CallArgs) -> Result<()> {
    let config = cli.config()?;
    let client = match cli.scheme {
        Scheme::Signed => Gs2Client::signed(cli.credential(), cli.region, config)?,
        Scheme::Token => Gs2Client::login(cli.credential(), cli.region, config)
            .await
            .context("Login failed")?,
    };

    let mut operation = Operation::new(&args.service, &args.function);
    if let Some(module) = &args.module {
        operation = operation.with_module(module);
    }

    let body = match &args.body {
        Some(body) => {
            let value: serde_json::Value =
                serde_json::from_str(body).context("--body is not valid JSON")?;
            Some(serde_json::to_vec(&value)?)
        }
        None => None,
    };

    let response = client
        .call(args.method, &args.path, &operation, body)
        .await
        .with_context(|| format!("{} {}.{} failed", args.method, args.service, args.function))?;

    if let Response::Body(bytes) = response {
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).context("Response is not valid JSON")?;
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_login_parsing() {
        let cli = Cli::try_parse_from([
            "gs2",
            "login",
            "--client-id",
            "a",
            "--client-secret",
            "b",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert_eq!(cli.client_id.as_deref(), Some("a"));
        assert_eq!(cli.client_secret.as_deref(), Some("b"));
    }

    #[test]
    fn test_cli_call_parsing() {
        let cli = Cli::try_parse_from([
            "gs2",
            "call",
            "post",
            "inbox",
            "SendMessage",
            "--module",
            "inbox-handler",
            "--path",
            "/message",
            "--body",
            r#"{"body":"hi"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.method, Method::Post);
                assert_eq!(args.service, "inbox");
                assert_eq!(args.function, "SendMessage");
                assert_eq!(args.module.as_deref(), Some("inbox-handler"));
                assert_eq!(args.path, "/message");
                assert_eq!(args.body.as_deref(), Some(r#"{"body":"hi"}"#));
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_call_defaults() {
        let cli = Cli::try_parse_from(["gs2", "call", "GET", "inbox", "DescribeMessages"]).unwrap();
        match cli.command {
            Commands::Call(args) => {
                assert_eq!(args.path, "/");
                assert_eq!(args.module, None);
                assert_eq!(args.body, None);
            }
            _ => panic!("Expected Call command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "gs2",
            "call",
            "GET",
            "inbox",
            "DescribeMessages",
            "--region",
            "US_EAST_1",
            "--scheme",
            "token",
            "--endpoint",
            "http://localhost:8080/{service}",
        ])
        .unwrap();
        assert_eq!(cli.region, Region::UsEast1);
        assert_eq!(cli.scheme, Scheme::Token);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:8080/{service}"));
    }

    #[test]
    fn test_cli_rejects_unknown_region() {
        let result = Cli::try_parse_from(["gs2", "--region", "mars-1", "login"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_method() {
        let result = Cli::try_parse_from(["gs2", "call", "PATCH", "inbox", "Update"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_no_subcommand_fails() {
        let result = Cli::try_parse_from(["gs2"]);
        assert!(result.is_err());
    }
}
