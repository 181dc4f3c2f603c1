use std::error::Error as _;
use std::process;

use clap::{App, AppSettings, Arg};
use daemon_rpc::{Credentials, Error, RpcClient};
use serde_json::Value;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://127.0.0.1:8332";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = app().get_matches();

    let credentials = Credentials::new(
        matches.value_of("RPC_URL").unwrap(),
        matches.value_of("RPC_USER").unwrap(),
        matches.value_of("RPC_PASSWORD").unwrap(),
    );
    let command = matches.value_of("COMMAND").unwrap();
    let params: Vec<String> = matches
        .values_of("PARAMS")
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default();

    let client = RpcClient::new(credentials);
    match client.call(command, params).await {
        Ok(result) => {
            if let Some(text) = format_result(&result) {
                println!("{}", text);
            }
        }
        Err(e) => {
            if e.is_fatal() {
                error!(error = ?e, "RPC call failed");
            }
            eprintln!("{}", format_error(&e));
            process::exit(exit_code(&e));
        }
    }
}

fn app() -> App<'static, 'static> {
    App::new("daemon-rpc")
        .version("0.1.0")
        .about("Send a single JSON-RPC command to a cryptocurrency daemon")
        .setting(AppSettings::TrailingVarArg)
        .setting(AppSettings::AllowNegativeNumbers)
        .arg(Arg::with_name("RPC_URL")
            .long("rpc-url")
            .help("Daemon RPC endpoint")
            .takes_value(true)
            .default_value(DEFAULT_URL))
        .arg(Arg::with_name("RPC_USER")
            .long("rpc-user")
            .help("RPC username")
            .takes_value(true)
            .default_value(""))
        .arg(Arg::with_name("RPC_PASSWORD")
            .long("rpc-password")
            .help("RPC password")
            .takes_value(true)
            .default_value(""))
        .arg(Arg::with_name("COMMAND")
            .help("The command to invoke")
            .required(true)
            .index(1))
        .arg(Arg::with_name("PARAMS")
            .help("String arguments, passed in order")
            .multiple(true)
            .allow_hyphen_values(true)
            .index(2))
}

/// Text printed on stdout for a successful call. Strings are printed raw and
/// null prints nothing.
fn format_result(result: &Value) -> Option<String> {
    match result {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())),
    }
}

/// Text printed on stderr for a failed call. Fatal errors include their
/// whole `source()` chain.
fn format_error(err: &Error) -> String {
    match err {
        Error::Rpc(rpc) => format!("error code: {}\nerror message:\n{}", rpc.code, rpc.message),
        fatal => {
            let mut message = format!("error: {}", fatal);
            let mut source = fatal.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {}", cause));
                source = cause.source();
            }
            message
        }
    }
}

fn exit_code(err: &Error) -> i32 {
    if err.is_fatal() {
        2
    } else {
        1
    }
}
