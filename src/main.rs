use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use paper::build::{build_site, clean};
use paper::config::Config;
use paper::util::slugify;
use paper::watch::watch;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = App::new("paper")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A static blog generator")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .global(true)
                .help("Logs at info level regardless of RUST_LOG"),
        )
        .arg(
            Arg::with_name("project")
                .short("p")
                .long("project")
                .takes_value(true)
                .global(true)
                .help("The project directory (default: searched upward from the current directory)"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .global(true)
                .help("The output directory (default: `dist` in the project root)"),
        )
        .subcommand(SubCommand::with_name("build").about("Builds the site"))
        .subcommand(
            SubCommand::with_name("dev").about("Builds the site and rebuilds it on changes"),
        )
        .subcommand(SubCommand::with_name("clean").about("Removes the output directory"))
        .subcommand(
            SubCommand::with_name("new")
                .about("Creates a new post")
                .arg(
                    Arg::with_name("title")
                        .required(true)
                        .multiple(true)
                        .help("The post title"),
                ),
        )
        .get_matches();

    let verbose = matches.is_present("verbose")
        || matches
            .subcommand()
            .1
            .map_or(false, |sub| sub.is_present("verbose"));
    init_logging(verbose);

    if let Err(e) = run(&matches) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("build", Some(_)) => {
            build_site(&load_config(matches)?)?;
            Ok(())
        }
        ("dev", Some(_)) => watch(load_config(matches)?),
        ("clean", Some(_)) => {
            let config = load_config(matches)?;
            clean(&config)?;
            tracing::info!("removed {}", config.output_directory.display());
            Ok(())
        }
        ("new", Some(sub)) => {
            let title = sub
                .values_of("title")
                .map(|words| words.collect::<Vec<_>>().join(" "))
                .unwrap_or_default();
            let path = new_post(&load_config(matches)?.posts_source_directory, &title)?;
            tracing::info!("created {}", path.display());
            Ok(())
        }
        (name, _) => Err(anyhow!("unknown command `{}`", name)),
    }
}

// Global options may be given before or after the subcommand; the
// subcommand's matches win.
fn option<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches
        .subcommand()
        .1
        .and_then(|sub| sub.value_of(name))
        .or_else(|| matches.value_of(name))
}

fn load_config(matches: &ArgMatches) -> Result<Config> {
    let output = option(matches, "output").map(PathBuf::from);
    let dir = match option(matches, "project") {
        Some(project) => PathBuf::from(project),
        None => std::env::current_dir()?,
    };
    Config::from_directory(&dir, output.as_deref())
}

// Writes `{posts}/{slug}.md` with front matter for `title`, dated today.
// Refuses to overwrite an existing post.
fn new_post(posts: &Path, title: &str) -> Result<PathBuf> {
    let slug = match slugify(title) {
        s if s.is_empty() => String::from("untitled"),
        s => s,
    };
    let path = posts.join(format!("{}.md", slug));
    if path.exists() {
        return Err(anyhow!("`{}` already exists", path.display()));
    }
    std::fs::create_dir_all(posts)?;
    std::fs::write(
        &path,
        format!(
            "---\ntitle: \"{}\"\ndate: {}\ntags: []\ndescription: \"\"\n---\n\n",
            title.replace('\\', "\\\\").replace('"', "\\\""),
            Local::now().format("%Y-%m-%d"),
        ),
    )?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_post() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let posts = dir.path().join("posts");
        let path = new_post(&posts, "Hello, \"Rust\" 世界")?;
        assert_eq!(path, posts.join("hello-rust-世界.md"));
        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.starts_with("---\ntitle: \"Hello, \\\"Rust\\\" 世界\"\ndate: "));

        assert!(new_post(&posts, "hello rust 世界").is_err());
        assert_eq!(new_post(&posts, "!!!")?, posts.join("untitled.md"));
        Ok(())
    }
}
