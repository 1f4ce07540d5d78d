use std::env;
use std::io::Write;
use std::path::Path;

use serde_json::json;

use autolocal::command::{CommandSpec, normalize};
use autolocal::config::{APP_DESC, APP_NAME, APP_VERSION, AdapterConfig};
use autolocal::flags::inject_read_flags;
use autolocal::logging::{init_logging, run_id};
use autolocal::wp::WpCli;

const EXIT_OK: i32 = 0;
const EXIT_RUNTIME: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn print_help() {
    println!("{APP_NAME} - {APP_DESC}");
    println!();
    println!("Usage:");
    println!("  {APP_NAME} <command> [args]");
    println!();
    println!("Commands:");
    println!("  run <domain> <cmd...>      Run a wp command, exit status only");
    println!("  capture <domain> <cmd...>  Run a wp command, pass stdout/stderr through");
    println!("  json <domain> <cmd...>     Run a wp command and print {{ok, payload}} JSON");
    println!("  json-at <path> <cmd...>    Same as json against an explicit install path");
    println!("  classify <cmd...>          Print the normalized argv and read-ish flag");
    println!("  version                    Print tool version");
    println!();
    println!("A single <cmd> argument is split shell-style; several are used as-is.");
    println!("Env: WP_CLI_PATH, AUTOLOCAL_SITE_ROOT, AUTOLOCAL_SITE_OWNER, WP_TIMEOUT,");
    println!("     AUTOLOCAL_ELEVATION, AUTOLOCAL_RID, RUST_LOG");
}

fn print_usage_error(usage: &str) -> i32 {
    eprintln!("{APP_NAME}: usage: {APP_NAME} {usage}");
    EXIT_USAGE
}

fn command_spec(args: &[String]) -> CommandSpec {
    match args {
        [single] => CommandSpec::Raw(single.clone()),
        many => CommandSpec::Argv(many.to_vec()),
    }
}

fn status_code(ok: bool) -> i32 {
    if ok { EXIT_OK } else { EXIT_RUNTIME }
}

fn print_typed(ok: bool, payload: serde_json::Value) -> i32 {
    println!("{}", json!({ "ok": ok, "payload": payload }));
    status_code(ok)
}

fn cmd_run(cli: &WpCli, args: &[String]) -> i32 {
    let [domain, rest @ ..] = args else {
        return print_usage_error("run <domain> <cmd...>");
    };
    if rest.is_empty() {
        return print_usage_error("run <domain> <cmd...>");
    }
    status_code(cli.run(domain, command_spec(rest)))
}

fn cmd_capture(cli: &WpCli, args: &[String]) -> i32 {
    let [domain, rest @ ..] = args else {
        return print_usage_error("capture <domain> <cmd...>");
    };
    if rest.is_empty() {
        return print_usage_error("capture <domain> <cmd...>");
    }
    let captured = cli.capture(domain, command_spec(rest));
    let _ = std::io::stdout().write_all(captured.stdout.as_bytes());
    let _ = std::io::stderr().write_all(captured.stderr.as_bytes());
    status_code(captured.ok)
}

fn cmd_json(cli: &WpCli, args: &[String]) -> i32 {
    let [domain, rest @ ..] = args else {
        return print_usage_error("json <domain> <cmd...>");
    };
    if rest.is_empty() {
        return print_usage_error("json <domain> <cmd...>");
    }
    let (ok, payload) = cli.json(domain, command_spec(rest));
    print_typed(ok, payload)
}

fn cmd_json_at(cli: &WpCli, args: &[String]) -> i32 {
    let [path, rest @ ..] = args else {
        return print_usage_error("json-at <path> <cmd...>");
    };
    if rest.is_empty() {
        return print_usage_error("json-at <path> <cmd...>");
    }
    let (ok, payload) = cli.json_at_path(Path::new(path), command_spec(rest));
    print_typed(ok, payload)
}

fn cmd_classify(config: &AdapterConfig, args: &[String]) -> i32 {
    if args.is_empty() {
        return print_usage_error("classify <cmd...>");
    }
    match normalize(&command_spec(args), &config.wp_cli_path) {
        Ok(mut parts) => {
            let readish = inject_read_flags(&mut parts);
            println!("{}", json!({ "argv": parts, "readish": readish }));
            EXIT_OK
        }
        Err(e) => {
            eprintln!("{APP_NAME}: {e}");
            EXIT_RUNTIME
        }
    }
}

pub fn run() -> i32 {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((cmd, rest)) = args.split_first() else {
        print_help();
        return EXIT_USAGE;
    };
    let rid = run_id();
    init_logging(&rid);
    let config = AdapterConfig::from_env();
    match cmd.as_str() {
        "help" | "-h" | "--help" => {
            print_help();
            EXIT_OK
        }
        "version" | "--version" => {
            println!("{APP_NAME} {APP_VERSION}");
            EXIT_OK
        }
        "classify" => cmd_classify(&config, rest),
        "run" => cmd_run(&WpCli::new(config), rest),
        "capture" => cmd_capture(&WpCli::new(config), rest),
        "json" => cmd_json(&WpCli::new(config), rest),
        "json-at" => cmd_json_at(&WpCli::new(config), rest),
        other => {
            eprintln!("{APP_NAME}: unknown command '{other}' [{rid}]");
            print_help();
            EXIT_USAGE
        }
    }
}
