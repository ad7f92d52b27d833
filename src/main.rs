// src/main.rs

use anyhow::Result;
use clap::Parser;
use rulewalk::cli::Cli;
use rulewalk::errors::Error;
use rulewalk::FileEnumerator;

fn main() -> Result<()> {
    // Initialize logging. Default to 'warn' if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    log::info!("Starting rulewalk v{}...", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let cli_config = cli.cli_config_data()?;

    let mut builder = FileEnumerator::builder()
        .use_config_files(!cli.no_config_search)
        .glob_input_paths(!cli.no_glob)
        .ignore(!cli.no_ignore);
    if let Some(config) = cli_config {
        builder = builder.cli_config(config);
    }
    if let Some(path) = &cli.config {
        builder = builder.config_file(path);
    }
    if let Some(dirs) = &cli.rules_dirs {
        builder = builder.rule_dirs(dirs.clone());
    }
    if let Some(extensions) = cli.extensions.clone() {
        builder = builder.extensions(extensions);
    }
    if let Some(path) = &cli.ignore_path {
        builder = builder.ignore_path(path);
    }
    if let Some(patterns) = cli.ignore_patterns.clone() {
        builder = builder.ignore_patterns(patterns);
    }
    let enumerator = builder.build()?;

    if let Some(path) = &cli.print_config {
        let array = enumerator.config_array_for_file(Some(path))?;
        let target = if path.is_absolute() {
            path.clone()
        } else {
            enumerator.cwd().join(path)
        };
        let extracted = array.extract_config(&target);
        println!(
            "{}",
            serde_json::to_string_pretty(&extracted.to_config_file_content())?
        );
        return Ok(());
    }

    let patterns = if cli.patterns.is_empty() {
        vec![".".to_string()]
    } else {
        cli.patterns.clone()
    };

    for entry in enumerator.iterate_files(patterns) {
        match entry {
            Ok(file) => {
                let sources: Vec<&str> =
                    file.config.iter().map(|e| e.name.as_str()).collect();
                if file.ignored {
                    println!(
                        "{} (ignored; named on the command line)",
                        file.file_path.display()
                    );
                } else {
                    println!("{} [{}]", file.file_path.display(), sources.join(", "));
                }
            }
            Err(e @ (Error::NoFilesFound { .. } | Error::AllFilesIgnored { .. })) => {
                eprintln!("rulewalk: {e}");
                std::process::exit(2);
            }
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
