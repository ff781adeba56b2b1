//! `journal-gatewayd` binary — CLI parsing, TLS material loading, and
//! the listen loop. The HTTP surface itself lives in `lib.rs`/`http`/
//! `stream`; this file only wires the process together, following the
//! shape of `services/server/src/main.rs` (tracing init, `AppState`,
//! `build_router`, `axum::serve`) and `services/streamer/src/main.rs`
//! (the `clap::Command` builder style).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};
use journal_core::{Journal, OpenFlags};
use tracing::{error, info};

use journal_gatewayd::state::AppState;
use journal_gatewayd::util::is_file;

const DEFAULT_PORT: &str = "19531";
const DEFAULT_DOCROOT: &str = "web";
const DEFAULT_JOURNAL_PATH: &str = "journal-gatewayd.sqlite3";

struct Args {
    show_version: bool,
    key_path: Option<PathBuf>,
    cert_path: Option<PathBuf>,
    port: u16,
    docroot: PathBuf,
    journal_path: PathBuf,
}

fn cli() -> Command {
    Command::new("journal-gatewayd")
        .about("Read-only HTTP gateway over a local structured log store")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .long("version")
                .action(ArgAction::SetTrue)
                .help("Print version and feature banner, then exit"),
        )
        .arg(
            Arg::new("key")
                .long("key")
                .value_name("PATH")
                .value_parser(|v: &str| is_file(v).map(|()| PathBuf::from(v)))
                .help("TLS private key in PEM format"),
        )
        .arg(
            Arg::new("cert")
                .long("cert")
                .value_name("PATH")
                .value_parser(|v: &str| is_file(v).map(|()| PathBuf::from(v)))
                .help("TLS certificate in PEM format"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .value_parser(clap::value_parser!(u16))
                .default_value(DEFAULT_PORT)
                .help("Port to listen on (ambient — not part of the upstream CLI)"),
        )
        .arg(
            Arg::new("docroot")
                .long("docroot")
                .value_name("DIR")
                .default_value(DEFAULT_DOCROOT)
                .help("Directory containing browse.html, served at /browse"),
        )
        .arg(
            Arg::new("journal-path")
                .long("journal-path")
                .value_name("PATH")
                .default_value(DEFAULT_JOURNAL_PATH)
                .help("Path to the embedded journal store"),
        )
}

/// `--version` short-circuits everything else; `--key`/`--cert` must be
/// given together or not at all; no positional arguments are accepted
/// (enforced by `clap` itself, since none are declared above).
fn parse_args() -> Result<Args, ExitCode> {
    let matches = cli().get_matches();

    let show_version = matches.get_flag("version");
    let key_path = matches.get_one::<PathBuf>("key").cloned();
    let cert_path = matches.get_one::<PathBuf>("cert").cloned();

    if key_path.is_some() != cert_path.is_some() {
        eprintln!("--key and --cert must be specified together");
        return Err(ExitCode::FAILURE);
    }

    Ok(Args {
        show_version,
        key_path,
        cert_path,
        port: *matches.get_one::<u16>("port").expect("port has a default"),
        docroot: PathBuf::from(matches.get_one::<String>("docroot").expect("docroot has a default")),
        journal_path: PathBuf::from(
            matches
                .get_one::<String>("journal-path")
                .expect("journal-path has a default"),
        ),
    })
}

fn print_version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("+RUSTLS +SQLITE +TRACING");
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return code,
    };

    if args.show_version {
        print_version();
        return ExitCode::SUCCESS;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "journal-gatewayd starting");

    let journal = match Journal::open(&args.journal_path, OpenFlags::default()).await {
        Ok(j) => j,
        Err(e) => {
            error!(error = %e, path = %args.journal_path.display(), "failed to open journal");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(journal, args.docroot);
    let router = journal_gatewayd::build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], args.port));

    match (args.key_path, args.cert_path) {
        (Some(key_path), Some(cert_path)) => serve_tls(router, addr, &key_path, &cert_path).await,
        _ => serve_plain(router, addr).await,
    }
}

async fn serve_plain(router: axum::Router, addr: std::net::SocketAddr) -> ExitCode {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(error = %e, %addr, "failed to bind listener");
            return ExitCode::FAILURE;
        }
    };
    info!(%addr, "listening (plaintext)");
    match axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

async fn serve_tls(
    router: axum::Router,
    addr: std::net::SocketAddr,
    key_path: &std::path::Path,
    cert_path: &std::path::Path,
) -> ExitCode {
    let key_pem = match tokio::fs::read(key_path).await {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, path = %key_path.display(), "failed to read key file");
            return ExitCode::FAILURE;
        }
    };
    let cert_pem = match tokio::fs::read(cert_path).await {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, path = %cert_path.display(), "failed to read certificate file");
            return ExitCode::FAILURE;
        }
    };

    let tls_config = match axum_server::tls_rustls::RustlsConfig::from_pem(cert_pem, key_pem).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "failed to build TLS config");
            return ExitCode::FAILURE;
        }
    };

    let handle = axum_server::Handle::new();
    tokio::spawn({
        let handle = handle.clone();
        async move {
            shutdown_signal().await;
            handle.graceful_shutdown(None);
        }
    });

    info!(%addr, "listening (TLS)");
    match axum_server::bind_rustls(addr, tls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server error");
            ExitCode::FAILURE
        }
    }
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful
/// shutdown — same composition `services/server/src/main.rs` uses.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
