mod cli;

use clipforge::config;
use clipforge::job::{self, JobArgs};

use anyhow::{Context, Result};
use cf_av::{FfprobeProbe, MediaProbe, MediaType, ToolRegistry};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=trace,cf_pipeline=debug,cf_av=debug,cf_core=debug".to_string()
        } else {
            "clipforge=info,cf_pipeline=info,cf_av=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Run {
            input,
            output,
            output_dir,
            audio,
            override_audio,
            pitch,
            rotate,
            brightness,
            contrast,
            saturation,
            json,
        } => {
            let args = JobArgs {
                input,
                output,
                output_dir,
                audio,
                override_audio,
                pitch,
                rotate,
                brightness,
                contrast,
                saturation,
            };
            run_file(&args, cli.config.as_deref(), json)
        }
        Commands::Probe { file, json } => probe_file(&file, cli.config.as_deref(), json),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e
                .downcast_ref::<cf_core::Error>()
                .map(cf_core::Error::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn run_file(args: &JobArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let request = args.to_request(&config.encoding.container)?;

    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        let token = CancellationToken::new();
        let interrupt = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling run");
                interrupt.cancel();
            }
        });

        job::run_job(&config, &request, token).await
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("Output: {}", outcome.output.display());
        let stages: Vec<&str> = outcome.stages.iter().map(|s| s.as_str()).collect();
        println!("Stages: {}", stages.join(" -> "));
        if let Some(selection) = outcome.selection {
            println!("Audio: {selection:?}");
        }
        if let Some(plan) = outcome.alignment {
            println!(
                "Alignment: {:?} to {:.3}s",
                plan.strategy, plan.target_duration_seconds
            );
        }
    }

    Ok(())
}

fn probe_file(file: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let probe = FfprobeProbe::from_registry(&tools)?;

    let rt = tokio::runtime::Runtime::new()?;
    let media_info = rt.block_on(probe.probe(file))?;

    if json {
        let json_str = serde_json::to_string_pretty(&media_info)?;
        println!("{}", json_str);
    } else {
        println!("File: {}", media_info.file_path.display());
        println!(
            "Container: {}",
            media_info.container.as_deref().unwrap_or("unknown")
        );
        match media_info.duration_seconds() {
            Some(secs) => println!("Duration: {secs:.3}s"),
            None => println!("Duration: unknown"),
        }
        println!("Has audio: {}", media_info.has_audio());

        println!("\nStreams: {}", media_info.streams.len());
        for stream in &media_info.streams {
            println!(
                "  [{}] {} {}",
                stream.index,
                stream.media_type,
                stream.codec.as_deref().unwrap_or("?")
            );
        }
        println!(
            "\nVideo: {}, Audio: {}",
            media_info.count(MediaType::Video),
            media_info.count(MediaType::Audio)
        );
    }

    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg to run the pipeline.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let path = path.map(Path::to_path_buf).or_else(config::find_default_config);

    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(&p)?;
            let warnings = config
                .validate()
                .context("Configuration is invalid")?;
            println!("✓ Configuration is valid");
            for warning in &warnings {
                println!("  warning: {warning}");
            }
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            print_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_summary(config: &config::Config) {
    println!(
        "  Work dir: {}",
        config
            .work_dir
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(output directory)".to_string())
    );
    println!(
        "  Encoding: {} / {} / {} @ {} Hz",
        config.encoding.container,
        config.encoding.video_codec,
        config.encoding.audio_codec,
        config.encoding.base_sample_rate
    );
    println!(
        "  Timeouts: probe {}s, transcode {}s",
        config.tools.probe_timeout_secs, config.tools.transcode_timeout_secs
    );
}
