use std::{
    fs,
    io::{self, Write},
    process::ExitCode,
};

use clap::{Arg, ArgMatches, Command};
use tracing::{error, info, span, Level};
use tracing_subscriber::EnvFilter;
use upyunfs::{
    adapters::http::HttpTransport, config, Config, File, Storage, StorageError, UpyunStorage,
};

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let span = span!(Level::INFO, "main", context = "main");
    let _e = span.enter();
    info!("called");

    let matches = cli().get_matches();

    match run(&matches) {
        Err(err) => {
            error!(error_message=%err, error_group="main");
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn cli() -> Command {
    let name = || Arg::new("NAME").required(true).index(1);

    clap::command!()
        .arg(
            Arg::new("account")
                .long("account")
                .env(config::ENV_ACCOUNT)
                .required(true),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .env(config::ENV_PASSWORD)
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("bucket")
                .long("bucket")
                .env(config::ENV_BUCKET)
                .required(true),
        )
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .env(config::ENV_API_URL)
                .default_value(config::DEFAULT_API_URL),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("put")
                .about("Upload a local file")
                .arg(name())
                .arg(Arg::new("PATH").required(true).index(2)),
        )
        .subcommand(
            Command::new("get")
                .about("Download a file, to stdout unless PATH is given")
                .arg(name())
                .arg(Arg::new("PATH").index(2)),
        )
        .subcommand(Command::new("rm").about("Delete a file").arg(name()))
        .subcommand(Command::new("exists").about("Check a file exists").arg(name()))
        .subcommand(Command::new("size").about("Print a file's size").arg(name()))
        .subcommand(Command::new("mtime").about("Print a file's modified time").arg(name()))
        .subcommand(Command::new("url").about("Print a file's url").arg(name()))
}

fn value<'a>(matches: &'a ArgMatches, id: &str) -> &'a str {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .unwrap_or_default()
}

fn run(matches: &ArgMatches) -> Result<(), StorageError> {
    let config = Config::new(
        value(matches, "account"),
        value(matches, "password"),
        value(matches, "bucket"),
    )
    .with_api_url(value(matches, "api-url"));
    info!(bucket = config.bucket(), api_url = config.api_url(), "config");

    let storage = UpyunStorage::new(config, Box::new(HttpTransport::new()?));

    execute(&storage, matches)
}

fn execute(storage: &UpyunStorage, matches: &ArgMatches) -> Result<(), StorageError> {
    let (command, sub) = match matches.subcommand() {
        None => return Ok(()),
        Some(subcommand) => subcommand,
    };
    let name = value(sub, "NAME");

    match command {
        "put" => {
            let mut source = fs::File::open(value(sub, "PATH"))?;
            println!("{}", storage.save(name, &mut source)?);
        }
        "get" => {
            // read() returns the body whatever the status
            if !storage.exists(name)? {
                error!(error_message = "file not found", error_group = "get", name = name);
                return Err(StorageError::NotFound(name.to_string()));
            }

            let mut file = storage.open(name, "rb")?;
            let data = file.read()?;
            file.close()?;

            match sub.get_one::<String>("PATH") {
                Some(path) => fs::write(path, data)?,
                None => io::stdout().write_all(&data)?,
            }
        }
        "rm" => storage.delete(name)?,
        "exists" => println!("{}", storage.exists(name)?),
        "size" => println!("{}", storage.size(name)?),
        "mtime" => {
            let _file = storage.open(name, "rb")?;
            println!("{}", storage.modified_time(name)?);
        }
        "url" => println!("{}", storage.url(name)),
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use upyunfs::{
        adapters::mock::MockTransport,
        model::http::{Method, Response},
    };

    use super::*;

    const CREDENTIALS: [&str; 7] = [
        "upyunfs",
        "--account",
        "a",
        "--password",
        "b",
        "--bucket",
        "bkt",
    ];

    fn storage(transport: &MockTransport) -> UpyunStorage {
        let config = Config::new("a", "b", "bkt").with_api_url("http://host");
        UpyunStorage::new(config, Box::new(transport.clone()))
    }

    fn matches(args: &[&str]) -> ArgMatches {
        cli()
            .try_get_matches_from(CREDENTIALS.iter().chain(args.iter()).copied())
            .unwrap()
    }

    fn temp_path(case: &str) -> PathBuf {
        std::env::temp_dir().join(format!("upyunfs-{}-{}", case, std::process::id()))
    }

    #[test]
    fn test_cli() {
        cli().debug_assert();
    }

    #[test]
    fn test_cli_args() {
        let cases = vec![
            (vec!["upyunfs", "--account", "a", "--password", "b", "--bucket", "bkt", "size", "f"], "size"),
            (vec!["upyunfs", "--account", "a", "--password", "b", "--bucket", "bkt", "put", "f", "p"], "put"),
            (vec!["upyunfs", "--account", "a", "--password", "b", "--bucket", "bkt", "get", "f"], "get"),
        ];

        for (args, expected) in cases {
            let matches = cli().try_get_matches_from(args).unwrap();
            let (command, sub) = matches.subcommand().unwrap();

            assert_eq!(command, expected);
            assert_eq!(value(sub, "NAME"), "f");
            assert_eq!(value(&matches, "api-url"), config::DEFAULT_API_URL);
        }
    }

    #[test]
    fn test_get_writes_file() {
        let transport = MockTransport::new();
        transport.push(Response::new(200, ""));
        transport.push(Response::new(200, "hello"));

        let path = temp_path("get-ok");
        let path_arg = path.to_string_lossy().to_string();
        execute(&storage(&transport), &matches(&["get", "dir/file.txt", &path_arg])).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"hello");
        fs::remove_file(&path).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Head);
        assert_eq!(requests[1].method, Method::Get);
        assert_eq!(requests[1].url, "http://host/bkt/dir/file.txt");
    }

    #[test]
    fn test_get_missing_writes_nothing() {
        let cases = vec![404, 201, 500];

        for status in cases {
            let transport = MockTransport::new();
            transport.push(Response::new(status, "not found"));
            transport.push(Response::new(status, "not found"));

            let path = temp_path(&format!("get-missing-{}", status));
            let path_arg = path.to_string_lossy().to_string();
            let res = execute(&storage(&transport), &matches(&["get", "missing", &path_arg]));

            assert!(
                matches!(res, Err(StorageError::NotFound(ref name)) if name == "missing"),
                "failed for case: {}",
                status
            );
            assert!(!path.exists(), "failed for case: {}", status);
            assert_eq!(transport.count(Method::Get), 0, "failed for case: {}", status);
        }
    }

    #[test]
    fn test_put_uploads_file() {
        let transport = MockTransport::new();

        let path = temp_path("put");
        fs::write(&path, b"hello").unwrap();
        let path_arg = path.to_string_lossy().to_string();
        let res = execute(&storage(&transport), &matches(&["put", "dir/file.txt", &path_arg]));
        fs::remove_file(&path).unwrap();
        res.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].body.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_rm_rejected() {
        let transport = MockTransport::new();
        transport.push(Response::new(200, "false"));

        let res = execute(&storage(&transport), &matches(&["rm", "file.txt"]));
        assert!(matches!(res, Err(StorageError::DeleteRejected)));
    }
}
