//! gatecond CLI: build and evaluate conditions from the command line.
//!
//! Subcommands:
//! - `check <expr>`: build a condition and report errors
//! - `eval <expr> [request flags]`: match one request, print `true`/`false`
//! - `rules <file> [request flags]`: load a rule file, print the first matching action
//! - `primitives`: list the primitive table with signatures

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};
use gatecond::{Condition, RuleSet};
use gatecond_http::fetchers::DEBUG_TIME_HEADER;
use gatecond_http::{Request, Response, Session, TlsState};
use http::{HeaderMap, StatusCode};

#[derive(Debug, Parser)]
#[command(name = "gatecond", version, about = "Build and evaluate gatecond conditions")]
struct Cli {
    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build a condition and report whether it is valid
    Check { expr: String },

    /// Build a condition and match it against one request
    Eval {
        expr: String,

        /// Also require the path to match this `{name}` template
        #[arg(long)]
        template: Option<String>,

        /// Let the template match a path prefix
        #[arg(long, requires = "template")]
        prefix: bool,

        /// Print the evaluation trace
        #[arg(long)]
        trace: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// Load a YAML or JSON rule file and print the first matching action
    Rules {
        file: PathBuf,

        /// Print every rule tried
        #[arg(long)]
        trace: bool,

        #[command(flatten)]
        request: RequestArgs,
    },

    /// List every primitive with its argument kinds
    Primitives,
}

/// Flags describing the request to evaluate.
#[derive(Debug, Args)]
struct RequestArgs {
    #[arg(long, default_value = "GET")]
    method: String,

    #[arg(long, default_value = "/")]
    uri: String,

    /// Host header value
    #[arg(long)]
    host: Option<String>,

    #[arg(long = "header", value_name = "NAME=VALUE", value_parser = parse_pair)]
    headers: Vec<(String, String)>,

    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = parse_pair)]
    cookies: Vec<(String, String)>,

    #[arg(long)]
    client_ip: Option<IpAddr>,

    #[arg(long)]
    vip: Option<IpAddr>,

    #[arg(long)]
    peer_ip: Option<IpAddr>,

    #[arg(long)]
    secure: bool,

    #[arg(long)]
    trusted: bool,

    /// TLS server name; implies a TLS session
    #[arg(long)]
    sni: Option<String>,

    /// Response status code
    #[arg(long)]
    status: Option<u16>,

    #[arg(long = "tag", value_name = "NAME=VALUE", value_parser = parse_pair)]
    tags: Vec<(String, String)>,

    #[arg(long)]
    host_tag: Option<String>,

    #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_pair)]
    context: Vec<(String, String)>,

    /// Request time as `YYYYMMDDhhmmssZ`, sent as the debug-time header
    #[arg(long)]
    time: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Check { expr } => cmd_check(&expr),
        Command::Eval {
            expr,
            template,
            prefix,
            trace,
            request,
        } => cmd_eval(&expr, template.as_deref(), prefix, trace, &request),
        Command::Rules {
            file,
            trace,
            request,
        } => cmd_rules(&file, trace, &request),
        Command::Primitives => {
            cmd_primitives();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

// ═══════════════════════════════════════════════════════════════════════════════
// Commands
// ═══════════════════════════════════════════════════════════════════════════════

fn cmd_check(expr: &str) -> Result<(), String> {
    let cond = gatecond_http::build(expr).map_err(|e| format!("condition invalid: {e}"))?;
    println!(
        "Condition valid ({} nodes, depth {})",
        cond.len(),
        cond.depth()
    );
    Ok(())
}

fn cmd_eval(
    expr: &str,
    template: Option<&str>,
    prefix: bool,
    trace: bool,
    args: &RequestArgs,
) -> Result<(), String> {
    let mut cond = gatecond_http::build(expr).map_err(|e| format!("condition invalid: {e}"))?;
    if let Some(template) = template {
        let path = gatecond_http::variable_condition(template, prefix)
            .map_err(|e| format!("template invalid: {e}"))?;
        cond = Condition::and(cond, path);
    }

    let req = build_request(args)?;
    if trace {
        println!("{:#?}", cond.trace(&req));
    }
    println!("{}", cond.matches(&req));

    let mut vars: Vec<(String, String)> =
        req.path_variables().unwrap_or_default().into_iter().collect();
    vars.sort();
    for (name, value) in vars {
        println!("  {name} = {value}");
    }
    Ok(())
}

fn cmd_rules(path: &Path, trace: bool, args: &RequestArgs) -> Result<(), String> {
    let rules = load_rules(path)?;
    let req = build_request(args)?;

    if trace {
        println!("{:#?}", rules.evaluate_with_trace(&req));
    }
    match rules.evaluate(&req) {
        Some(serde_json::Value::String(action)) => println!("{action}"),
        Some(action) => println!("{action}"),
        None => println!("(no match)"),
    }
    Ok(())
}

fn cmd_primitives() {
    let table = gatecond_http::table();
    let mut signatures: Vec<String> = table.primitives().iter().map(|p| p.signature()).collect();
    signatures.sort();
    for signature in signatures {
        println!("{signature}");
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rule file loading
// ═══════════════════════════════════════════════════════════════════════════════

fn load_rules(path: &Path) -> Result<RuleSet<Request, serde_json::Value>, String> {
    log::debug!("loading rules from {}", path.display());
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("failed to read \"{}\": {e}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let loaded = if is_json {
        gatecond_http::load_rules_json(&content)
    } else {
        // .yaml, .yml, or anything else
        gatecond_http::load_rules_yaml(&content)
    };
    loaded.map_err(|e| format!("rule file invalid: {e}"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Request assembly
// ═══════════════════════════════════════════════════════════════════════════════

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("invalid pair \"{s}\", expected key=value"))
}

fn build_request(args: &RequestArgs) -> Result<Request, String> {
    let mut builder = Request::builder()
        .method(args.method.as_str())
        .uri(args.uri.as_str());

    if let Some(host) = &args.host {
        builder = builder.header(http::header::HOST, host.as_str());
    }
    for (name, value) in &args.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    for (name, value) in &args.cookies {
        builder = builder.cookie(name, value);
    }
    if let Some(time) = &args.time {
        builder = builder.header(DEBUG_TIME_HEADER, time.as_str());
    }
    if let Some(ip) = args.client_ip {
        builder = builder.client_ip(ip);
    }
    if let Some(session) = session(args) {
        builder = builder.session(session);
    }
    if let Some(code) = args.status {
        let status =
            StatusCode::from_u16(code).map_err(|_| format!("invalid status code {code}"))?;
        builder = builder.response(Response {
            status,
            headers: HeaderMap::new(),
        });
    }
    if let Some(tag) = &args.host_tag {
        builder = builder.host_tag(tag.as_str());
    }
    for (name, value) in &args.tags {
        builder = builder.tag(name.as_str(), value.as_str());
    }
    for (key, value) in &args.context {
        builder = builder.context_value(key.as_str(), value.as_str());
    }

    builder.build().map_err(|e| format!("invalid request: {e}"))
}

/// A session exists once any session-level flag is given.
fn session(args: &RequestArgs) -> Option<Session> {
    let any = args.vip.is_some()
        || args.peer_ip.is_some()
        || args.secure
        || args.trusted
        || args.sni.is_some();
    any.then(|| Session {
        peer_ip: args.peer_ip,
        vip: args.vip,
        secure: args.secure,
        trusted: args.trusted,
        tls: args.sni.as_ref().map(|sni| TlsState {
            sni: sni.clone(),
            client_auth: false,
            client_ca_name: None,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn request_args(extra: &[&str]) -> RequestArgs {
        let mut argv = vec!["gatecond", "eval", "default_t()"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Eval { request, .. } => request,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_pair_splits_on_first_equals() {
        assert_eq!(
            parse_pair("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("badformat").is_err());
    }

    #[test]
    fn flags_become_a_request() {
        let args = request_args(&[
            "--method",
            "POST",
            "--uri",
            "/api?x=1",
            "--host",
            "Example.com:8080",
            "--header",
            "X-Env=prod",
            "--cookie",
            "uid=42",
            "--client-ip",
            "10.0.0.1",
            "--sni",
            "example.com",
            "--status",
            "503",
            "--tag",
            "zone=a",
            "--context",
            "tenant=acme",
        ]);
        let req = build_request(&args).unwrap();
        assert_eq!(req.method().as_str(), "POST");
        assert_eq!(req.host().as_deref(), Some("example.com"));
        assert_eq!(req.port(), Some(8080));
        assert_eq!(req.header("x-env").as_deref(), Some("prod"));
        assert_eq!(req.client_ip(), Some("10.0.0.1".parse().unwrap()));
        assert_eq!(
            req.session().unwrap().tls.as_ref().unwrap().sni,
            "example.com"
        );
        assert_eq!(req.response().unwrap().status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(req.tag("zone").unwrap(), ["a".to_string()]);
        assert_eq!(req.context_value("tenant").as_deref(), Some("acme"));

        let cond = gatecond_http::build(
            r#"req_method_in("POST") && req_cookie_value_in("uid", "42", false) && res_code_in("503")"#,
        )
        .unwrap();
        assert!(cond.matches(&req));
    }

    #[test]
    fn no_session_flags_means_no_session() {
        let req = build_request(&request_args(&[])).unwrap();
        assert!(req.session().is_none());
        assert!(req.response().is_none());
    }

    #[test]
    fn bad_status_is_reported() {
        let args = request_args(&["--status", "42"]);
        assert!(build_request(&args).is_err());
    }

    #[test]
    fn loads_yaml_rules() {
        let dir = std::env::temp_dir().join(format!("gatecond-cli-{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rules.yaml");
        std::fs::write(
            &path,
            "rules:\n  - cond: 'req_path_prefix_in(\"/api\", false)'\n    action: api\ndefault: web\n",
        )
        .unwrap();

        let rules = load_rules(&path).unwrap();
        let api = build_request(&request_args(&["--uri", "/api/v1"])).unwrap();
        let web = build_request(&request_args(&["--uri", "/index.html"])).unwrap();
        assert_eq!(rules.evaluate(&api), Some(serde_json::json!("api")));
        assert_eq!(rules.evaluate(&web), Some(serde_json::json!("web")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_bad_rule_file() {
        let dir = std::env::temp_dir().join(format!("gatecond-cli-bad-{}", process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rules.json");
        std::fs::write(&path, r#"{"rules": [{"cond": "a && b", "action": 1}]}"#).unwrap();

        let err = load_rules(&path).unwrap_err();
        assert!(err.contains("rule 0"), "{err}");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
